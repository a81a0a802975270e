#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyState {
    /// No endpoint configured yet.
    NotConfigured,
    /// Endpoint configured, last fetch returned nothing.
    NoCodes,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub rows: Vec<CodeRowView>,
    pub is_loading: bool,
    pub is_deleting: bool,
    pub banner: Option<String>,
    pub empty_state: EmptyState,
    pub last_refresh_label: Option<String>,
    pub dark_mode: Option<bool>,
    pub auto_refresh_secs: u32,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRowView {
    pub id: String,
    pub code: String,
    pub contact: String,
    pub source: Option<String>,
    pub relative_time: String,
    pub absolute_time: String,
    pub copied: bool,
}
