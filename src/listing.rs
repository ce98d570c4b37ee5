//! Hit-testing seam to the file-store collaborator.
//!
//! The engine never owns the file tree.  Each frame it asks a `Listing`
//! what sits under the cursor and which folder is current; the emitted
//! actions carry back whatever the listing handed out.

/// Kind of a listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// One entry of the currently visible listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub content: Option<String>,
}

impl ListingItem {
    pub fn file(id: &str, name: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ItemKind::File,
            content: Some(content.to_string()),
        }
    }

    pub fn folder(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ItemKind::Folder,
            content: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

/// What the cursor is over.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// The "up one level" zone.
    Back,
    Item(ListingItem),
}

impl HitTarget {
    /// Stable identifier used for hover tracking.
    pub fn id(&self) -> &str {
        match self {
            Self::Back => "BACK_BUTTON",
            Self::Item(item) => &item.id,
        }
    }

    /// Back zone and folders can be navigated into.
    pub fn is_navigable(&self) -> bool {
        match self {
            Self::Back => true,
            Self::Item(item) => item.is_folder(),
        }
    }
}

/// Screen-space view of the file store's current listing.
pub trait Listing {
    /// Identifier of the folder being shown, `None` at the root.
    fn current_folder(&self) -> Option<&str>;

    /// Target under the screen-space point `(x, y)`, if any.
    fn hit_test(&self, x: f32, y: f32) -> Option<HitTarget>;
}

// ── Sidebar layout ─────────────────────────────────────────

/// Sidebar geometry: a header row (the back zone when not at the root)
/// followed by fixed-height item rows.
#[derive(Debug, Clone)]
pub struct SidebarLayout {
    pub width_px: f32,
    pub header_px: f32,
    pub row_px: f32,
}

impl Default for SidebarLayout {
    fn default() -> Self {
        Self {
            width_px: 280.0,
            header_px: 60.0,
            row_px: 56.0,
        }
    }
}

/// Default `Listing`: the visible items of one folder laid out as a
/// vertical sidebar.
#[derive(Debug, Clone, Default)]
pub struct SidebarListing {
    pub layout: SidebarLayout,
    /// Folder path from the root; empty at the root.
    pub path: Vec<String>,
    pub items: Vec<ListingItem>,
}

impl SidebarListing {
    pub fn new(items: Vec<ListingItem>) -> Self {
        Self {
            layout: SidebarLayout::default(),
            path: Vec::new(),
            items,
        }
    }
}

impl Listing for SidebarListing {
    fn current_folder(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<HitTarget> {
        if x < 0.0 || x >= self.layout.width_px {
            return None;
        }
        if y > 0.0 && y < self.layout.header_px {
            return if self.path.is_empty() {
                None
            } else {
                Some(HitTarget::Back)
            };
        }
        let list_y = y - self.layout.header_px;
        if list_y <= 0.0 {
            return None;
        }
        let row = (list_y / self.layout.row_px).floor() as usize;
        self.items.get(row).cloned().map(HitTarget::Item)
    }
}

// ── Tests ──────────────────────────────────────────────────
