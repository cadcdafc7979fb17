//! Opens the tree viewer. Any arguments are image paths to hang on the tree.

use appletree::{PhotoSource, Viewer};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let photos: Vec<PhotoSource> = std::env::args_os()
        .skip(1)
        .map(|arg| PhotoSource::File(arg.into()))
        .collect();
    log::info!("starting with {} photo(s)", photos.len());

    if let Err(e) = Viewer::new().with_photos(photos).run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
