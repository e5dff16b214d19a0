//! First-run setup and teardown workflow.
//!
//! Sequence for [`SetupOrchestrator::create`]:
//! 1. Submit the first-run setup form (signs the administrator in).
//! 2. Upload the import bundle. The import replaces the database, which
//!    wipes the account and configuration created in step 1.
//! 3. Submit the setup form again to restore them.
//! 4. Confirm the login page no longer redirects to `/setup`.
//! 5. Sign in.
//! 6. Find or create the administrator's API token.
//! 7. Apply the mail relay settings through the structured API, if any.
//!
//! The first failing step aborts the sequence. Nothing is retried.

use chrono::Utc;
use http::Method;

use super::SetupStep;
use super::spec::{ConfigEntry, CtfdSetup, SetupSpec};
use crate::api::{ApiToken, RequestExecutor, TokenProvisioner};
use crate::client::{CtfdError, CtfdResult};
use crate::events::{ClientEvent, SetupStepEvent};
use crate::session::{
    ADMIN_CONFIG_PATH, Availability, MultipartForm, RequestBody, SETUP_PATH, TransportRequest,
    TransportResponse, extract_alert_message,
};

const IMPORT_PATH: &str = "/admin/import";
const RESET_PATH: &str = "/admin/reset";
const CONFIGS_PATH: &str = "/api/v1/configs";

/// Participant grouping submitted with the setup form.
const USER_MODE: &str = "teams";

/// Resource categories cleared by a reset.
const RESET_CATEGORIES: [&str; 5] = [
    "accounts",
    "submissions",
    "challenges",
    "pages",
    "notifications",
];

pub struct SetupOrchestrator<'a> {
    executor: &'a mut RequestExecutor,
    admin_user_id: u64,
}

impl<'a> SetupOrchestrator<'a> {
    pub fn new(executor: &'a mut RequestExecutor, admin_user_id: u64) -> Self {
        Self {
            executor,
            admin_user_id,
        }
    }

    /// Run the full setup sequence and return the adopted API token.
    pub async fn create(&mut self, spec: &SetupSpec) -> CtfdResult<ApiToken> {
        let result = self.do_setup(spec, SetupStep::InitialSetup).await;
        self.record(SetupStep::InitialSetup, result)?;

        let result = self.import_configuration(spec).await;
        self.record(SetupStep::Import, result)?;

        let result = self.do_setup(spec, SetupStep::RepeatSetup).await;
        self.record(SetupStep::RepeatSetup, result)?;

        let result = self.verify_provisioned().await;
        self.record(SetupStep::Availability, result)?;

        let result = self.executor.sessions_mut().sign_in().await;
        self.record(SetupStep::SignIn, result)?;

        let result = TokenProvisioner::new(self.executor, self.admin_user_id)
            .get_or_create_token()
            .await;
        let token = self.record(SetupStep::TokenProvisioning, result)?;

        if let Some(email) = &spec.email {
            let result = self
                .executor
                .send_empty(Method::PATCH, CONFIGS_PATH, &email.to_config_patch())
                .await;
            self.record(SetupStep::MailConfiguration, result)?;
        }

        Ok(token)
    }

    /// Reset every destructible resource category, returning the instance to
    /// its first-run state.
    pub async fn delete(&mut self) -> CtfdResult<()> {
        let result = self.reset().await;
        self.record(SetupStep::Reset, result)
    }

    /// Read the current name and description from the config API.
    pub async fn read(&self) -> CtfdResult<CtfdSetup> {
        read_setup(self.executor).await
    }

    async fn do_setup(&mut self, spec: &SetupSpec, step: SetupStep) -> CtfdResult<()> {
        let credentials = self.executor.sessions().session().credentials().clone();
        let fields = vec![
            ("ctf_name".to_string(), spec.name.clone()),
            ("ctf_description".to_string(), spec.description.clone()),
            ("name".to_string(), credentials.username),
            ("email".to_string(), spec.admin_email.clone()),
            ("password".to_string(), credentials.password),
            ("user_mode".to_string(), USER_MODE.to_string()),
        ];

        let response = self
            .executor
            .sessions_mut()
            .submit_form(SETUP_PATH, SETUP_PATH, fields)
            .await?;

        if !response.is_redirect {
            return Err(protocol_failure(step, &response));
        }

        self.executor.sessions_mut().mark_active();
        Ok(())
    }

    async fn import_configuration(&mut self, spec: &SetupSpec) -> CtfdResult<()> {
        self.executor.sessions().require_active()?;

        let path = &spec.configuration_path;
        let content = tokio::fs::read(path).await.map_err(|source| CtfdError::Io {
            path: path.clone(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import.zip".to_string());

        let sessions = self.executor.sessions_mut();
        let nonce = sessions.refresh_token(ADMIN_CONFIG_PATH).await?;
        let form = MultipartForm::new()
            .text("nonce", nonce)
            .file("backup", file_name, content);

        let url = sessions.session().endpoint(IMPORT_PATH)?;
        let response = sessions
            .send(
                TransportRequest::new(Method::POST, url)
                    .with_body(RequestBody::Multipart(form)),
            )
            .await?;

        if !response.is_redirect {
            return Err(protocol_failure(SetupStep::Import, &response));
        }

        // The imported database no longer holds the account behind our cookie.
        sessions.mark_inactive();
        Ok(())
    }

    async fn verify_provisioned(&mut self) -> CtfdResult<()> {
        match self.executor.sessions().check_availability().await? {
            Availability::Provisioned => Ok(()),
            Availability::Unprovisioned => Err(CtfdError::Protocol {
                step: SetupStep::Availability,
                message: format!("login page still redirects to {SETUP_PATH}"),
            }),
        }
    }

    async fn reset(&mut self) -> CtfdResult<()> {
        self.executor.sessions().require_active()?;

        let fields = RESET_CATEGORIES
            .iter()
            .map(|category| (category.to_string(), "y".to_string()))
            .collect();
        let response = self
            .executor
            .sessions_mut()
            .submit_form(ADMIN_CONFIG_PATH, RESET_PATH, fields)
            .await?;

        if !response.is_redirect {
            return Err(protocol_failure(SetupStep::Reset, &response));
        }
        if !response.redirects_to(SETUP_PATH) {
            return Err(CtfdError::Protocol {
                step: SetupStep::Reset,
                message: format!(
                    "redirected to {} instead of {SETUP_PATH}",
                    response.location().unwrap_or("<no location>")
                ),
            });
        }

        self.executor.clear_credential();
        self.executor.sessions_mut().mark_inactive();
        Ok(())
    }

    fn record<T>(&self, step: SetupStep, result: CtfdResult<T>) -> CtfdResult<T> {
        self.executor
            .sessions()
            .events()
            .dispatch(ClientEvent::SetupStep(SetupStepEvent {
                step,
                success: result.is_ok(),
                timestamp: Utc::now(),
            }));
        result
    }
}

/// Read the current setup through the structured API. Needs only a token.
pub async fn read_setup(executor: &RequestExecutor) -> CtfdResult<CtfdSetup> {
    let entries: Vec<ConfigEntry> = executor.get(CONFIGS_PATH).await?;
    Ok(CtfdSetup::from_entries(&entries))
}

/// Classify a missing redirect, preferring the page's own alert text.
fn protocol_failure(step: SetupStep, response: &TransportResponse) -> CtfdError {
    match extract_alert_message(&response.text()) {
        Ok(message) => CtfdError::Protocol { step, message },
        Err(source) => CtfdError::ErrorExtraction {
            step,
            status: response.status,
            source,
        },
    }
}
