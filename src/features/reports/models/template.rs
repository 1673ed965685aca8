use serde::{Deserialize, Serialize};

/// Server-side report layout selector, serialized as its wire id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum TemplateKind {
    ScanVulnerabilityOriented,
    ScanResultStateOriented,
    ProjectTemplate,
    SingleTeamTemplate,
    MultiTeamsTemplate,
    Application,
    Executive,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 7] = [
        TemplateKind::ScanVulnerabilityOriented,
        TemplateKind::ScanResultStateOriented,
        TemplateKind::ProjectTemplate,
        TemplateKind::SingleTeamTemplate,
        TemplateKind::MultiTeamsTemplate,
        TemplateKind::Application,
        TemplateKind::Executive,
    ];

    pub fn wire_id(self) -> i32 {
        match self {
            TemplateKind::ScanVulnerabilityOriented => 1,
            TemplateKind::ScanResultStateOriented => 2,
            TemplateKind::ProjectTemplate => 3,
            TemplateKind::SingleTeamTemplate => 4,
            TemplateKind::MultiTeamsTemplate => 5,
            TemplateKind::Application => 6,
            TemplateKind::Executive => 7,
        }
    }

    pub fn from_wire_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.wire_id() == id)
    }

    pub fn is_scan(self) -> bool {
        matches!(
            self,
            TemplateKind::ScanVulnerabilityOriented | TemplateKind::ScanResultStateOriented
        )
    }

    pub fn is_team(self) -> bool {
        matches!(
            self,
            TemplateKind::SingleTeamTemplate | TemplateKind::MultiTeamsTemplate
        )
    }
}

impl From<TemplateKind> for i32 {
    fn from(kind: TemplateKind) -> Self {
        kind.wire_id()
    }
}

impl TryFrom<i32> for TemplateKind {
    type Error = String;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::from_wire_id(id).ok_or_else(|| format!("unknown template id {}", id))
    }
}
