pub struct Icons;

impl Icons {
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const HINT: &str = "💡";
    pub const FILE: &str = "📄";
    pub const FOLDER: &str = "📁";
    pub const DATABASE: &str = "🗄️";
    pub const GLOBE: &str = "🌐";
    pub const TABLE: &str = "📊";
    pub const LINK: &str = "🔗";
}
