pub mod ds4;
