use std::collections::HashMap;
use std::fmt;

use themedhl_highlight::{Color, ColorBrush};
use tracing::debug;

use crate::error::ThemeError;
use crate::model::{GlobalStyle, ThemeModel};

/// Editor resource slots a global style may recolor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceSlot {
    EditorBackground,
    EditorForeground,
    CurrentLineBackground,
    CurrentLineBorder,
    LineNumbersForeground,
    SelectionBackground,
    SelectionBorder,
    LinkTextBackground,
    LinkTextForeground,
    NonPrintableCharacter,
}

impl ResourceSlot {
    pub const ALL: [ResourceSlot; 10] = [
        ResourceSlot::EditorBackground,
        ResourceSlot::EditorForeground,
        ResourceSlot::CurrentLineBackground,
        ResourceSlot::CurrentLineBorder,
        ResourceSlot::LineNumbersForeground,
        ResourceSlot::SelectionBackground,
        ResourceSlot::SelectionBorder,
        ResourceSlot::LinkTextBackground,
        ResourceSlot::LinkTextForeground,
        ResourceSlot::NonPrintableCharacter,
    ];

    /// Host resource key.
    pub fn key(self) -> &'static str {
        match self {
            ResourceSlot::EditorBackground => "EditorBackground",
            ResourceSlot::EditorForeground => "EditorForeground",
            ResourceSlot::CurrentLineBackground => "EditorCurrentLineBackground",
            ResourceSlot::CurrentLineBorder => "EditorCurrentLineBorder",
            ResourceSlot::LineNumbersForeground => "EditorLineNumbersForeground",
            ResourceSlot::SelectionBackground => "EditorSelectionBrush",
            ResourceSlot::SelectionBorder => "EditorSelectionBorder",
            ResourceSlot::LinkTextBackground => "EditorLinkTextBackgroundBrush",
            ResourceSlot::LinkTextForeground => "EditorLinkTextForegroundBrush",
            ResourceSlot::NonPrintableCharacter => "EditorNonPrintableCharacterBrush",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|slot| slot.key() == key)
    }
}

impl fmt::Display for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChannel {
    Foreground,
    Background,
    Border,
}

impl StyleChannel {
    fn pick(self, style: &GlobalStyle) -> Option<ColorBrush> {
        match self {
            StyleChannel::Foreground => style.foreground,
            StyleChannel::Background => style.background,
            StyleChannel::Border => style.border,
        }
    }
}

/// The closed set of global style type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalStyleKind {
    DefaultStyle,
    CurrentLineBackground,
    LineNumbersForeground,
    Selection,
    Hyperlink,
    NonPrintableCharacter,
}

impl GlobalStyleKind {
    pub const ALL: [GlobalStyleKind; 6] = [
        GlobalStyleKind::DefaultStyle,
        GlobalStyleKind::CurrentLineBackground,
        GlobalStyleKind::LineNumbersForeground,
        GlobalStyleKind::Selection,
        GlobalStyleKind::Hyperlink,
        GlobalStyleKind::NonPrintableCharacter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GlobalStyleKind::DefaultStyle => "DefaultStyle",
            GlobalStyleKind::CurrentLineBackground => "CurrentLineBackground",
            GlobalStyleKind::LineNumbersForeground => "LineNumbersForeground",
            GlobalStyleKind::Selection => "Selection",
            GlobalStyleKind::Hyperlink => "Hyperlink",
            GlobalStyleKind::NonPrintableCharacter => "NonPrintableCharacter",
        }
    }

    /// Case-sensitive, like the overlay's element names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Slots written by this style, in application order.
    pub fn targets(self) -> &'static [(ResourceSlot, StyleChannel)] {
        match self {
            GlobalStyleKind::DefaultStyle => &[
                (ResourceSlot::EditorBackground, StyleChannel::Background),
                (ResourceSlot::EditorForeground, StyleChannel::Foreground),
            ],
            GlobalStyleKind::CurrentLineBackground => &[
                (ResourceSlot::CurrentLineBackground, StyleChannel::Background),
                (ResourceSlot::CurrentLineBorder, StyleChannel::Border),
            ],
            GlobalStyleKind::LineNumbersForeground => &[(
                ResourceSlot::LineNumbersForeground,
                StyleChannel::Foreground,
            )],
            GlobalStyleKind::Selection => &[
                (ResourceSlot::SelectionBackground, StyleChannel::Background),
                (ResourceSlot::SelectionBorder, StyleChannel::Border),
            ],
            GlobalStyleKind::Hyperlink => &[
                (ResourceSlot::LinkTextBackground, StyleChannel::Background),
                (ResourceSlot::LinkTextForeground, StyleChannel::Foreground),
            ],
            GlobalStyleKind::NonPrintableCharacter => &[(
                ResourceSlot::NonPrintableCharacter,
                StyleChannel::Foreground,
            )],
        }
    }
}

/// Receiver of resolved chrome colors.
pub trait ResourceSink {
    fn set(&mut self, slot: ResourceSlot, color: Color);
}

/// Pushes every global style of `model` into `sink`.
///
/// Styles apply in model order; an unknown type name stops the walk with
/// [`ThemeError::UnsupportedStyle`], leaving earlier writes in place. Absent
/// colors never reach the sink.
pub fn apply_global_styles(
    model: &ThemeModel,
    sink: &mut dyn ResourceSink,
) -> Result<(), ThemeError> {
    for style in model.global_styles() {
        let kind = GlobalStyleKind::from_name(&style.type_name)
            .ok_or_else(|| ThemeError::UnsupportedStyle(style.type_name.clone()))?;
        for (slot, channel) in kind.targets() {
            if let Some(brush) = channel.pick(style) {
                debug!(theme = model.name(), slot = slot.key(), color = %brush, "applying global style");
                sink.set(*slot, brush.color());
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValue {
    Color(Color),
    /// Anything the host keeps under a slot key that is not a plain color.
    Opaque(String),
}

/// In-memory resource dictionary that only recolors slots already holding a
/// color; missing or non-color slots are left alone.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    values: HashMap<ResourceSlot, ResourceValue>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slot seeded with a light-editor default.
    pub fn with_editor_defaults() -> Self {
        let mut table = Self::new();
        for slot in ResourceSlot::ALL {
            let color = match slot {
                ResourceSlot::EditorBackground | ResourceSlot::LinkTextBackground => {
                    Color::rgb(0xFF, 0xFF, 0xFF)
                }
                ResourceSlot::EditorForeground => Color::rgb(0x00, 0x00, 0x00),
                ResourceSlot::CurrentLineBackground => Color::argb(0x22, 0x00, 0x00, 0xFF),
                ResourceSlot::CurrentLineBorder => Color::argb(0x00, 0xFF, 0xFF, 0xFF),
                ResourceSlot::LineNumbersForeground => Color::rgb(0x2B, 0x91, 0xAF),
                ResourceSlot::SelectionBackground => Color::argb(0x60, 0x33, 0x99, 0xFF),
                ResourceSlot::SelectionBorder => Color::rgb(0x33, 0x99, 0xFF),
                ResourceSlot::LinkTextForeground => Color::rgb(0x00, 0x00, 0xFF),
                ResourceSlot::NonPrintableCharacter => Color::rgb(0xC0, 0xC0, 0xC0),
            };
            table.insert(slot, ResourceValue::Color(color));
        }
        table
    }

    pub fn insert(&mut self, slot: ResourceSlot, value: ResourceValue) -> Option<ResourceValue> {
        self.values.insert(slot, value)
    }

    pub fn get(&self, slot: ResourceSlot) -> Option<&ResourceValue> {
        self.values.get(&slot)
    }

    pub fn color(&self, slot: ResourceSlot) -> Option<Color> {
        match self.values.get(&slot) {
            Some(ResourceValue::Color(color)) => Some(*color),
            _ => None,
        }
    }
}

impl ResourceSink for ResourceTable {
    fn set(&mut self, slot: ResourceSlot, color: Color) {
        if let Some(ResourceValue::Color(current)) = self.values.get_mut(&slot) {
            *current = color;
        }
    }
}
