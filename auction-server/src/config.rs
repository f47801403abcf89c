use clap::{
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    Args,
    Parser,
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the auction server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    /// Bearer token required for the admin-only routes (create, start, pause,
    /// resume, end, cancel, timer).
    #[arg(long = "admin-api-key")]
    #[arg(env = "ADMIN_API_KEY")]
    pub admin_api_key: String,
}
