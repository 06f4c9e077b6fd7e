use serde::{Deserialize, Serialize};

/// Create/edit form body. Every field arrives as text; the empty string
/// stands for "not provided" on the optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub about_me: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub projects: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_address: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
}
