mod common;
mod files;
mod ingest;
mod pipeline;
