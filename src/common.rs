pub mod canvas;
pub mod config;
pub mod controller;
pub mod drawing;
pub mod error;
pub mod fluent;
pub mod model;
pub mod observer;
pub mod recipes;
pub mod render;
pub mod shapes;
pub mod uuid;
