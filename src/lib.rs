//! Diagram items for UML, SysML, RAAML and C4 notations.
//!
//! Every item binds one model element to a shape tree that is rebuilt when
//! the watched parts of the model change, and painted through an
//! [`common::canvas::NHCanvas`].

pub mod c4model;
pub mod common;
pub mod diagram;
pub mod raaml;
pub mod support;
pub mod sysml;
pub mod uml;
