use clap::Parser;
use railmatch::app::{RailMatchApp, RailMatchAppError};

fn main() -> Result<(), RailMatchAppError> {
    env_logger::init();
    let args = RailMatchApp::parse();
    args.op.run().inspect_err(|e| log::error!("{e}"))
}
