mod config;
mod kernels;
