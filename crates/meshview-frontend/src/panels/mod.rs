//! UI panels

mod properties;

pub use properties::PropertiesPanel;
