//! Custom widgets for the meter UI

mod loudness_view;

pub use loudness_view::LoudnessView;
