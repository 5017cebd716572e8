// src/main.rs
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use egl_widget::{
    app::App,
    config::WidgetConfig,
    core::surface::backend::SelectedPlatform,
    error::Result,
    variants::{MeshViewer, TexturedQuad, Triangle},
};

const SHADER_DIR: &str = "shaders";
const DEFAULT_TEXTURE: &str = "textures/texture256x256.png";
const DEFAULT_MESH: &str = "meshes/logo3d.obj";
const USAGE: &str = "usage: egl-widget [triangle | texture [png] | mesh [obj [scale]]]";

enum Command {
    Triangle,
    Texture(PathBuf),
    Mesh(PathBuf, f32),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Command> {
    let command = match args.next().as_deref() {
        None | Some("triangle") => Command::Triangle,
        Some("texture") => {
            let path = args.next().unwrap_or_else(|| DEFAULT_TEXTURE.into());
            Command::Texture(path.into())
        }
        Some("mesh") => {
            let path = args.next().unwrap_or_else(|| DEFAULT_MESH.into()).into();
            let scale = match args.next() {
                Some(scale) => scale.parse().ok()?,
                None => 1.0,
            };
            Command::Mesh(path, scale)
        }
        Some(_) => return None,
    };
    args.next().is_none().then_some(command)
}

fn run(command: Command) -> Result<()> {
    let shaders = Path::new(SHADER_DIR);
    let tune = |config: WidgetConfig| config.with_env_overrides();

    match command {
        Command::Triangle => {
            App::<SelectedPlatform>::run(&tune(Triangle::config()), Triangle::new(shaders))
        }
        Command::Texture(png) => {
            let widget = TexturedQuad::new(shaders, &png)?;
            App::<SelectedPlatform>::run(&tune(TexturedQuad::config()), widget)
        }
        Command::Mesh(obj, scale) => {
            let widget = MeshViewer::new(shaders, &obj, scale)?;
            App::<SelectedPlatform>::run(&tune(MeshViewer::config()), widget)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(command) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
