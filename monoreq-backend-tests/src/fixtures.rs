mod errors;
mod lifecycle;
mod multipart;
mod transport;
