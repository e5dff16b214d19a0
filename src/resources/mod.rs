//! Typed per-resource calls. Each maps to one structured API request.

pub mod challenges;
pub mod teams;
pub mod tokens;
pub mod users;

pub use challenges::{Challenge, Challenges, Tag};
pub use teams::{NewTeam, Team, TeamMembership, Teams};
pub use tokens::Tokens;
pub use users::{NewUser, UpdateUser, User, UserType, Users};
