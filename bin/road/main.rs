mod app;
mod drive;
mod viewer;
#[path = "../boilerplate.rs"]
mod boilerplate;

use roadtrip::game::Screen;

fn main() {
    use std::env;

    let (harness, settings) = boilerplate::Harness::init(boilerplate::HarnessOptions { title: "road" });

    let args: Vec<_> = env::args().collect();
    let mut options = getopts::Options::new();
    options
        .parsing_style(getopts::ParsingStyle::StopAtFirstFree)
        .optflag("h", "help", "print this help menu")
        .optopt("t", "texture", "skip the viewer and drive with the given texture", "INDEX");

    let matches = options.parse(&args[1..]).unwrap();
    let texture = match matches.opt_str("t").map(|s| s.parse::<usize>()) {
        None => None,
        Some(Ok(index)) if index >= 1 && index <= settings.assets.car_texture_count => Some(index),
        Some(_) => {
            println!(
                "Texture index must be between 1 and {}",
                settings.assets.car_texture_count
            );
            return;
        }
    };
    if matches.opt_present("h") || !matches.free.is_empty() {
        println!("Road trip driving game");
        let brief = format!("Usage: {} [options]", args[0]);
        println!("{}", options.usage(&brief));
        return;
    }

    let screen = match texture {
        Some(texture) => Screen::Driving { texture },
        None => Screen::Viewer,
    };
    let app = app::RoadApp::new(settings, &harness.graphics_ctx, screen);
    harness.main_loop(app);
}
