mod entry;
mod logger;
mod prompt;
mod shutdown_handlers;
mod summary;

use volley::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
