pub mod c4_items;
