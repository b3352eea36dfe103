pub mod sysml_items;
