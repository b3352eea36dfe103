pub mod uml_glyphs;
pub mod uml_items;
pub mod uml_property_pages;
