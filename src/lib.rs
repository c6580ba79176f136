pub mod compiler;
pub mod diag;
pub mod glsl;
pub mod scene;
pub mod trace;
