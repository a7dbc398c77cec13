//! Presentation layer: egui panels and charts fed by [`crate::state::ViewModel`].

pub mod panels;
pub mod plot;
