//! Fax id classification.

/// What kind of record an id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaxIdKind {
    /// `in_...` / `in-...` ids.
    Inbound,
    /// `fbj_...` / `job_...` ids.
    Outbound,
    /// Anything else.
    Unknown,
}

impl FaxIdKind {
    /// Classify an id by its prefix, ignoring case.
    pub fn classify(id: &str) -> Self {
        let lower = id.to_ascii_lowercase();
        if lower.starts_with("in_") || lower.starts_with("in-") {
            FaxIdKind::Inbound
        } else if lower.starts_with("fbj_") || lower.starts_with("job_") {
            FaxIdKind::Outbound
        } else {
            FaxIdKind::Unknown
        }
    }

    /// Whether lookups go to the inbound endpoints.
    ///
    /// Unknown ids are looked up as outbound jobs.
    pub fn is_inbound(self) -> bool {
        matches!(self, FaxIdKind::Inbound)
    }
}
