pub mod raaml_glyphs;
pub mod raaml_items;
