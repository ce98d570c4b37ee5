//! In-memory file store for offline replay.
//!
//! Plays the file-store/UI side of the action protocol: it owns a small
//! folder tree, answers hit tests for the folder being shown and consumes
//! every emitted action in its wire form (name plus payload).  Actions
//! that open, close or rename files move the UI mode the session is fed
//! on the next frame.

use anyhow::{bail, ensure, Context, Result};
use tracing::{debug, info, warn};

use crate::action::{escape_string, parse_file_payload, parse_item_payload, Action};
use crate::listing::{HitTarget, Listing, ListingItem, SidebarListing};
use crate::session::UiMode;

#[derive(Debug, Clone)]
struct Entry {
    item: ListingItem,
    parent: Option<String>,
}

/// Folder tree plus the UI state the actions drive.
#[derive(Debug, Clone, Default)]
pub struct ReplayStore {
    entries: Vec<Entry>,
    path: Vec<String>,
    mode: UiMode,
    /// Mode to return to when the rename dialog closes.
    rename_return: UiMode,
    open_file: Option<String>,
    renaming: Option<String>,
    zoom_px: Option<u32>,
    created: usize,
    /// Sidebar view of the current folder, rebuilt after every change.
    view: SidebarListing,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two folders with a file each, and two loose files at the root.
    pub fn demo() -> Self {
        let mut store = Self::new();
        store.insert(None, ListingItem::folder("root_1", "projects"));
        store.insert(None, ListingItem::folder("root_2", "photos"));
        store.insert(None, ListingItem::file("root_3", "notes.md", "# Notes\n"));
        store.insert(None, ListingItem::file("root_4", "todo.txt", "buy milk\n"));
        store.insert(Some("root_1"), ListingItem::file("root_1_1", "main.rs", "fn main() {}\n"));
        store.insert(Some("root_2"), ListingItem::file("root_2_1", "cat.png", ""));
        store
    }

    /// Add an item under `parent` (`None` is the root).
    pub fn insert(&mut self, parent: Option<&str>, item: ListingItem) {
        self.entries.push(Entry {
            item,
            parent: parent.map(str::to_string),
        });
        self.refresh();
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    /// Force the UI mode, e.g. from a recorded override.
    pub fn set_mode(&mut self, mode: UiMode) {
        if mode != self.mode {
            debug!("Replay mode forced: {} -> {}", self.mode.as_str(), mode.as_str());
            self.mode = mode;
        }
    }

    pub fn open_file(&self) -> Option<&str> {
        self.open_file.as_deref()
    }

    pub fn zoom_px(&self) -> Option<u32> {
        self.zoom_px
    }

    /// Items shown in the current folder.
    pub fn items(&self) -> &[ListingItem] {
        &self.view.items
    }

    pub fn find(&self, id: &str) -> Option<&ListingItem> {
        self.entries.iter().map(|e| &e.item).find(|i| i.id == id)
    }

    /// Apply an emitted action.  Actions the store cannot honor are
    /// logged and dropped.
    pub fn apply(&mut self, action: &Action) {
        if let Err(e) = self.apply_event(action.name(), action.payload().as_deref()) {
            warn!("Ignoring {}: {:#}", action.name(), e);
        }
    }

    /// Apply one action given by protocol name and payload.
    pub fn apply_event(&mut self, name: &str, detail: Option<&str>) -> Result<()> {
        match name {
            "NAVIGATE" => self.navigate(detail.context("missing payload")?)?,
            "CREATE_FILE" => self.create_file(detail.unwrap_or("root"))?,
            "OPEN_FILE" => {
                let file = parse_file_payload(detail.context("missing payload")?)?;
                ensure!(self.find(&file.id).is_some(), "no such file: {}", file.id);
                info!("Opened {} ({} bytes)", file.name, file.content.len());
                self.open_file = Some(file.id);
                self.mode = UiMode::FileOpen;
            }
            "CLOSE_FILE" => {
                ensure!(self.mode == UiMode::FileOpen, "no file is open");
                self.open_file = None;
                self.mode = UiMode::Browse;
            }
            "SAVE_FILE" | "REVERT_FILE" => {
                let id = self.open_file.as_deref().context("no file is open")?;
                info!("{} {}", name, id);
            }
            "ZOOM_FILE" => {
                let px = detail.context("missing payload")?;
                self.zoom_px = Some(px.parse::<u32>().with_context(|| format!("invalid zoom size: {}", px))?);
            }
            "RENAME_FILE" => {
                let item = parse_item_payload(detail.context("missing payload")?)?;
                ensure!(self.find(&item.id).is_some(), "no such file: {}", item.id);
                self.begin_rename(item.id);
            }
            "RENAME_OPEN_FILE" => {
                let id = self.open_file.clone().context("no file is open")?;
                self.begin_rename(id);
            }
            "CONFIRM_RENAME" | "CANCEL_RENAME" => {
                let id = self.renaming.take().context("no rename in progress")?;
                info!("{} {}", name, id);
                self.mode = self.rename_return;
            }
            "DELETE_FILE" => {
                let item = parse_item_payload(detail.context("missing payload")?)?;
                let Some(pos) = self.entries.iter().position(|e| e.item.id == item.id) else {
                    bail!("no such file: {}", item.id);
                };
                ensure!(!self.entries[pos].item.is_folder(), "{} is a folder", item.name);
                self.entries.remove(pos);
                if self.open_file.as_deref() == Some(item.id.as_str()) {
                    self.open_file = None;
                }
                info!("Deleted {}", item.name);
                self.refresh();
            }
            other => debug!("Replay store ignores {} {:?}", other, detail),
        }
        Ok(())
    }

    fn navigate(&mut self, detail: &str) -> Result<()> {
        if detail == "Went up one level" {
            ensure!(self.path.pop().is_some(), "already at the root");
        } else {
            let Some(name) = detail.strip_prefix("Opened ") else {
                bail!("unrecognized navigation: {}", detail);
            };
            let Some(folder) = self.view.items.iter().find(|i| i.is_folder() && i.name == name) else {
                bail!("no folder named {} here", name);
            };
            self.path.push(folder.id.clone());
        }
        info!("Folder: /{}", self.path.join("/"));
        self.refresh();
        Ok(())
    }

    fn create_file(&mut self, parent: &str) -> Result<()> {
        let parent = (parent != "root").then_some(parent);
        if let Some(id) = parent {
            ensure!(
                self.find(id).is_some_and(ListingItem::is_folder),
                "no such folder: {}",
                id
            );
        }
        self.created += 1;
        let item = ListingItem::file(
            &format!("new_{}", self.created),
            &format!("untitled-{}.txt", self.created),
            "",
        );
        info!("Created {}", item.name);
        self.insert(parent, item);
        Ok(())
    }

    fn begin_rename(&mut self, id: String) {
        self.rename_return = if self.mode == UiMode::FileOpen {
            UiMode::FileOpen
        } else {
            UiMode::Browse
        };
        self.renaming = Some(id);
        self.mode = UiMode::Renaming;
    }

    fn refresh(&mut self) {
        let current = self.path.last();
        self.view.path = self.path.clone();
        self.view.items = self
            .entries
            .iter()
            .filter(|e| e.parent.as_ref() == current)
            .map(|e| e.item.clone())
            .collect();
    }

    /// S-expression rendering of the store state.
    pub fn status_sexp(&self) -> String {
        let quoted = |s: Option<&str>| {
            s.map(|s| format!("\"{}\"", escape_string(s)))
                .unwrap_or_else(|| "nil".to_string())
        };
        let names: Vec<String> = self
            .view
            .items
            .iter()
            .map(|i| format!("\"{}\"", escape_string(&i.name)))
            .collect();
        format!(
            "(:mode {} :folder {} :open {} :zoom {} :items ({}))",
            self.mode.as_str(),
            quoted(self.path.last().map(String::as_str)),
            quoted(self.open_file.as_deref()),
            self.zoom_px.map(|p| p.to_string()).unwrap_or_else(|| "nil".to_string()),
            names.join(" "),
        )
    }
}

impl Listing for ReplayStore {
    fn current_folder(&self) -> Option<&str> {
        self.view.current_folder()
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<HitTarget> {
        self.view.hit_test(x, y)
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ItemRef, Navigation};

    fn names(store: &ReplayStore) -> Vec<&str> {
        store.items().iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_navigate_moves_listing() {
        let mut s = ReplayStore::demo();
        assert_eq!(names(&s), vec!["projects", "photos", "notes.md", "todo.txt"]);

        let projects = ListingItem::folder("root_1", "projects");
        s.apply(&Action::Navigate(Navigation::Enter(projects)));
        assert_eq!(s.current_folder(), Some("root_1"));
        assert_eq!(names(&s), vec!["main.rs"]);
        // Header row is the back zone below the root.
        assert_eq!(s.hit_test(100.0, 30.0), Some(HitTarget::Back));

        s.apply(&Action::Navigate(Navigation::Up));
        assert_eq!(s.current_folder(), None);
        // Up at the root is dropped.
        s.apply(&Action::Navigate(Navigation::Up));
        assert_eq!(s.current_folder(), None);
    }

    #[test]
    fn test_open_close_drive_mode() {
        let mut s = ReplayStore::demo();
        let notes = s.find("root_3").cloned().unwrap();
        s.apply(&Action::OpenFile(notes));
        assert_eq!(s.mode(), UiMode::FileOpen);
        assert_eq!(s.open_file(), Some("root_3"));

        s.apply(&Action::ZoomFile(24));
        assert_eq!(s.zoom_px(), Some(24));

        s.apply(&Action::CloseFile);
        assert_eq!(s.mode(), UiMode::Browse);
        assert_eq!(s.open_file(), None);
    }

    #[test]
    fn test_rename_returns_to_previous_mode() {
        let mut s = ReplayStore::demo();
        s.apply(&Action::RenameFile(ItemRef { id: "root_4".into(), name: "todo.txt".into() }));
        assert_eq!(s.mode(), UiMode::Renaming);
        s.apply(&Action::CancelRename);
        assert_eq!(s.mode(), UiMode::Browse);

        let todo = s.find("root_4").cloned().unwrap();
        s.apply(&Action::OpenFile(todo));
        s.apply(&Action::RenameOpenFile);
        assert_eq!(s.mode(), UiMode::Renaming);
        s.apply(&Action::ConfirmRename);
        assert_eq!(s.mode(), UiMode::FileOpen);
    }

    #[test]
    fn test_create_and_delete() {
        let mut s = ReplayStore::demo();
        s.apply(&Action::CreateFile { parent_id: None });
        assert_eq!(names(&s).last(), Some(&"untitled-1.txt"));

        s.apply(&Action::DeleteFile(ItemRef { id: "new_1".into(), name: "untitled-1.txt".into() }));
        assert!(s.find("new_1").is_none());
        assert_eq!(names(&s).len(), 4);

        // Folders are not deleted.
        s.apply(&Action::DeleteFile(ItemRef { id: "root_1".into(), name: "projects".into() }));
        assert!(s.find("root_1").is_some());
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let mut s = ReplayStore::demo();
        assert!(s.apply_event("OPEN_FILE", Some("{not json")).is_err());
        assert!(s.apply_event("RENAME_FILE", Some("{\"id\": 3}")).is_err());
        assert!(s.apply_event("OPEN_FILE", None).is_err());
        assert!(s.apply_event("NAVIGATE", Some("Opened nowhere")).is_err());
        assert_eq!(s.mode(), UiMode::Browse);
        // Number-mode events carry no store state.
        assert!(s.apply_event("NUMBER_DETECTED", Some("3")).is_ok());
    }

    #[test]
    fn test_status_sexp() {
        let mut s = ReplayStore::demo();
        s.apply(&Action::Navigate(Navigation::Enter(ListingItem::folder("root_2", "photos"))));
        assert_eq!(
            s.status_sexp(),
            "(:mode browse :folder \"root_2\" :open nil :zoom nil :items (\"cat.png\"))"
        );
    }
}
