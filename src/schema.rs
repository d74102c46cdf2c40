//! Column names of the lead sheet export.

// ── Source columns ──────────────────────────────────────────────────────────
pub const DATE: &str = "Fecha";
pub const STATUS: &str = "Estatus";
pub const REJECTION_REASON: &str = "Motivo_Rechazo";
pub const CHANNEL: &str = "Canal";
pub const PRODUCT: &str = "Producto";
pub const LEADS_OBTAINED: &str = "Leads_Obtenidos";
pub const CPA: &str = "CPA";
pub const ROI: &str = "ROI";
pub const CTR: &str = "CTR";

pub const REQUIRED: [&str; 9] = [
    DATE,
    STATUS,
    REJECTION_REASON,
    CHANNEL,
    PRODUCT,
    LEADS_OBTAINED,
    CPA,
    ROI,
    CTR,
];

// ── Derived columns ─────────────────────────────────────────────────────────
pub const OUTCOME: &str = "lead_status";

// ── Status values ───────────────────────────────────────────────────────────
pub mod status {
    pub const COMPLETED: &str = "Completado";
    pub const IN_PROGRESS: &str = "En progreso";
    pub const NOT_REJECTED: &str = "N/A";
}

/// Format of `Fecha` cells.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
