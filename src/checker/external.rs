//! Off-site link checks.
//!
//! One GET per URL with a global timeout. Redirects are followed; the
//! final status decides. Failures are warnings: other people's servers
//! going down must not fail a build.

use std::time::Duration;
use ureq::Agent;

/// Status some sites (LinkedIn) answer crawlers with.
const BOGUS_STATUS: u16 = 999;

pub fn is_ok_status(status: u16) -> bool {
    (200..300).contains(&status) || status == BOGUS_STATUS
}

pub struct ExternalChecker {
    agent: Agent,
}

impl ExternalChecker {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    /// `Err` carries the reason the link is considered broken.
    pub fn check(&self, url: &str) -> Result<(), String> {
        match self.agent.get(url).call() {
            Ok(response) => {
                let status = response.status().as_u16();
                if is_ok_status(status) {
                    Ok(())
                } else {
                    Err(format!("HTTP {status}"))
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }
}
