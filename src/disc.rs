pub mod basis;
pub mod geometric;
pub mod linalg;
pub mod mesh;
pub mod ogs;
