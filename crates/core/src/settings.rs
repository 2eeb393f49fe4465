//! Per-user notification/security preferences.

use serde::{Deserialize, Serialize};

use crate::id::{SettingsId, UserId};

/// Preference toggles; exactly one row exists per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub id: SettingsId,
    pub user_id: UserId,
    pub payment_alerts: bool,
    pub exchange_alerts: bool,
    pub login_alerts: bool,
    pub two_factor: bool,
}

impl Settings {
    /// Row provisioned at registration: alerts on, two-factor off.
    pub fn provisioned(id: SettingsId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            payment_alerts: true,
            exchange_alerts: true,
            login_alerts: true,
            two_factor: false,
        }
    }

    /// Apply a partial update, leaving unset fields untouched.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.payment_alerts {
            self.payment_alerts = v;
        }
        if let Some(v) = patch.exchange_alerts {
            self.exchange_alerts = v;
        }
        if let Some(v) = patch.login_alerts {
            self.login_alerts = v;
        }
        if let Some(v) = patch.two_factor {
            self.two_factor = v;
        }
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub payment_alerts: Option<bool>,
    pub exchange_alerts: Option<bool>,
    pub login_alerts: Option<bool>,
    pub two_factor: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_set_fields() {
        let mut settings = Settings::provisioned(SettingsId::new(1), UserId::new(1));
        settings.apply(&SettingsPatch {
            two_factor: Some(true),
            payment_alerts: Some(false),
            ..SettingsPatch::default()
        });

        assert!(settings.two_factor);
        assert!(!settings.payment_alerts);
        assert!(settings.exchange_alerts);
        assert!(settings.login_alerts);
    }
}
