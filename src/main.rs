#![warn(clippy::all, rust_2018_idioms)]

use futures::executor::block_on;
use std::error::Error;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use photo_canvas::error::StoreError;
use photo_canvas::image::{FsImageLoader, ImageKitTransformer, ImageLoader};
use photo_canvas::store::{JsonFileStore, Project, ProjectId, ProjectStore};
use photo_canvas::util::time::SystemClock;
use photo_canvas::{EditorConfig, EditorServices, EditorSession, PhotoEditorApp};

const CONFIG_FILE: &str = "photo_canvas.json";

/// Usage: `photo_canvas <project-id> [image]`
///
/// Opens a project from the state directory. When the project does not exist
/// yet and an image is given, a project sized to the image is created first.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let mut args = std::env::args().skip(1);
    let project_id = ProjectId::new(args.next().unwrap_or_else(|| "untitled".to_owned()));
    let image = args.next();

    let config = EditorConfig::load(Path::new(CONFIG_FILE))?;
    let store = Rc::new(JsonFileStore::new(&config.state_dir));
    let loader = Rc::new(FsImageLoader::new());

    if let Some(image) = image {
        if let Err(StoreError::NotFound(_)) = block_on(store.get(&project_id)) {
            let loaded = block_on(loader.load(&image))?;
            let project = Project::new(project_id.clone(), project_id.0.clone(), loaded.width, loaded.height)
                .with_image(loaded.url);
            store.insert(&project)?;
            log::info!("Created project {}", project_id);
        }
    }

    let services = EditorServices {
        store,
        loader,
        transformer: Rc::new(ImageKitTransformer),
    };
    let session = block_on(EditorSession::open_from_store(
        &project_id,
        config,
        services,
        Arc::new(SystemClock),
    ))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "photo_canvas",
        native_options,
        Box::new(|cc| Ok(Box::new(PhotoEditorApp::new(cc, session)))),
    )?;
    Ok(())
}
