//! Session layer: transport seam, anti-forgery tokens and the sign-in state
//! machine.

pub mod html;
pub mod manager;
pub mod nonce;
pub mod reqwest_transport;
pub mod transport;

pub use html::{HtmlError, extract_alert_message};
pub use manager::{
    ADMIN_CONFIG_PATH, Availability, Credentials, LOGIN_PATH, LOGOUT_PATH, SETTINGS_PATH,
    SETUP_PATH, Session, SessionManager, SessionState,
};
pub use nonce::{NonceError, extract_nonce};
pub use reqwest_transport::ReqwestTransport;
pub use transport::{
    HttpTransport, MultipartFile, MultipartForm, RequestBody, TransportError, TransportRequest,
    TransportResponse,
};
