//! Run the vision pass over a saved screenshot and dump the region crops.
//! Usage: cargo run --bin inspect_frame --features cli -- <screenshot.png> [data_dir] [out_dir]

use std::path::PathBuf;

use tft_vision::{detect_layout, name_strip, ChampionMatcher, TextReader};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <screenshot.png> [data_dir] [out_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let data_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let out_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("debug_output"));
    let _ = std::fs::create_dir_all(&out_dir);

    let frame = image::open(&input_path)
        .expect("Failed to open screenshot")
        .to_rgba8();
    let (w, h) = (frame.width(), frame.height());
    println!("Frame: {}x{}", w, h);

    let data = tft_data::GameData::load(&data_dir).expect("Failed to load game data");
    let index = data.name_index();
    let matcher = ChampionMatcher::load(&data_dir, &data).expect("Failed to load templates");
    let reader = TextReader::new();

    let layout = detect_layout(&frame);
    println!(
        "HUD top: {:.1}% (y={:.0})",
        layout.hud_top * 100.0,
        layout.hud_top * h as f64
    );

    for (i, card) in layout.shop_slots.iter().enumerate() {
        let crop = tft_capture::crop_region(&frame, card);
        let _ = crop.save(out_dir.join(format!("shop_slot_{}.png", i)));
        let strip = tft_capture::crop_region(&frame, &name_strip(card));
        let _ = strip.save(out_dir.join(format!("shop_name_{}.png", i)));
        println!(
            "Shop slot {}: x={:.0} y={:.0} w={:.0} h={:.0}",
            i,
            card.x * w as f64,
            card.y * h as f64,
            card.width * w as f64,
            card.height * h as f64,
        );
    }

    for (name, region) in [
        ("gold", &layout.gold),
        ("level", &layout.level),
        ("stage", &layout.stage),
    ] {
        let crop = tft_capture::crop_region(&frame, region);
        let _ = crop.save(out_dir.join(format!("{}.png", name)));
    }

    println!("\n=== Vision pass ===");
    let result = tft_vision::process_frame(&frame, &matcher, &reader, &index);
    for read in &result.shop {
        println!(
            "Slot {}: {} (cost {:?}, confidence {:.2})",
            read.slot_index,
            read.champion.as_deref().unwrap_or("-"),
            read.cost,
            read.confidence,
        );
    }
    println!("Gold: {:?}  Level: {:?}  Stage: {:?}", result.gold, result.level, result.stage);
    println!("Bench: {:?}", result.bench);
    println!("\nCrops written to {}", out_dir.display());
}
