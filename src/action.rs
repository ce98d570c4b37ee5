//! Actions emitted to the file-store/UI collaborator.
//!
//! Each action is a name plus an optional string payload.  Item payloads
//! are JSON objects; the rest are plain strings.  `to_sexp` renders the
//! pair as an event s-expression for line-oriented consumers.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::listing::ListingItem;

/// Where a navigation goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Enter(ListingItem),
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Locked,
    Unlocked,
}

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Unlocked => "UNLOCKED",
        }
    }
}

/// Identity of a file referenced by rename/delete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemRef {
    pub id: String,
    pub name: String,
}

impl From<&ListingItem> for ItemRef {
    fn from(item: &ListingItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
        }
    }
}

/// File payload carried by `OPEN_FILE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilePayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// A discrete user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(Navigation),
    /// New file in the given folder (`None` is the root).
    CreateFile { parent_id: Option<String> },
    OpenFile(ListingItem),
    SaveFile,
    CloseFile,
    RevertFile,
    ZoomFile(u32),
    ZoomStatus(LockStatus),
    RenameFile(ItemRef),
    RenameOpenFile,
    ConfirmRename,
    CancelRename,
    DeleteFile(ItemRef),
    NumberDetected(u8),
    EnterNumberMode,
    ExitNumberMode,
    DialRotate { value: u8, angle: f32 },
    DialLock,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "NAVIGATE",
            Self::CreateFile { .. } => "CREATE_FILE",
            Self::OpenFile(_) => "OPEN_FILE",
            Self::SaveFile => "SAVE_FILE",
            Self::CloseFile => "CLOSE_FILE",
            Self::RevertFile => "REVERT_FILE",
            Self::ZoomFile(_) => "ZOOM_FILE",
            Self::ZoomStatus(_) => "ZOOM_STATUS",
            Self::RenameFile(_) => "RENAME_FILE",
            Self::RenameOpenFile => "RENAME_OPEN_FILE",
            Self::ConfirmRename => "CONFIRM_RENAME",
            Self::CancelRename => "CANCEL_RENAME",
            Self::DeleteFile(_) => "DELETE_FILE",
            Self::NumberDetected(_) => "NUMBER_DETECTED",
            Self::EnterNumberMode => "ENTER_NUMBER_MODE",
            Self::ExitNumberMode => "EXIT_NUMBER_MODE",
            Self::DialRotate { .. } => "DIAL_ROTATE",
            Self::DialLock => "DIAL_LOCK",
        }
    }

    /// Payload string, if the action carries one.
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::Navigate(Navigation::Enter(item)) => Some(format!("Opened {}", item.name)),
            Self::Navigate(Navigation::Up) => Some("Went up one level".to_string()),
            Self::CreateFile { parent_id } => {
                Some(parent_id.clone().unwrap_or_else(|| "root".to_string()))
            }
            Self::OpenFile(item) => Some(
                json!({
                    "id": item.id,
                    "name": item.name,
                    "content": item.content.as_deref().unwrap_or(""),
                })
                .to_string(),
            ),
            Self::ZoomFile(px) => Some(px.to_string()),
            Self::ZoomStatus(status) => Some(status.as_str().to_string()),
            Self::RenameFile(item) | Self::DeleteFile(item) => {
                Some(json!({ "id": item.id, "name": item.name }).to_string())
            }
            Self::NumberDetected(n) => Some(n.to_string()),
            Self::DialRotate { value, angle } => {
                Some(json!({ "value": value, "angle": angle.round() }).to_string())
            }
            _ => None,
        }
    }

    /// Payload-less action by protocol name, for binding tables.
    pub fn from_binding_name(name: &str) -> Option<Self> {
        Some(match name {
            "SAVE_FILE" => Self::SaveFile,
            "CLOSE_FILE" => Self::CloseFile,
            "REVERT_FILE" => Self::RevertFile,
            "RENAME_OPEN_FILE" => Self::RenameOpenFile,
            "CONFIRM_RENAME" => Self::ConfirmRename,
            "CANCEL_RENAME" => Self::CancelRename,
            "ENTER_NUMBER_MODE" => Self::EnterNumberMode,
            "EXIT_NUMBER_MODE" => Self::ExitNumberMode,
            "DIAL_LOCK" => Self::DialLock,
            "NAVIGATE_UP" => Self::Navigate(Navigation::Up),
            _ => return None,
        })
    }

    /// Event s-expression: `(:type :event :event :action :name "X" :detail "...")`.
    pub fn to_sexp(&self) -> String {
        let name = format!("\"{}\"", self.name());
        match self.payload() {
            Some(detail) => {
                let detail = format!("\"{}\"", escape_string(&detail));
                format_event("action", &[("name", &name), ("detail", &detail)])
            }
            None => format_event("action", &[("name", &name)]),
        }
    }
}

// ── Boundary parsing ───────────────────────────────────────

/// Parse an `OPEN_FILE` payload.
pub fn parse_file_payload(detail: &str) -> Result<FilePayload> {
    serde_json::from_str(detail).context("malformed OPEN_FILE payload")
}

/// Parse a `RENAME_FILE`/`DELETE_FILE` payload.
pub fn parse_item_payload(detail: &str) -> Result<ItemRef> {
    serde_json::from_str(detail).context("malformed item payload")
}

// ── Event rendering ────────────────────────────────────────

/// Escape a payload or label for a double-quoted s-expression string.
/// Newlines in file content pass through unchanged.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `(:type :event :event :KIND :key val ...)`.  Callers quote and
/// escape string values; keywords and numbers go in as-is.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

// ── Tests ──────────────────────────────────────────────────
