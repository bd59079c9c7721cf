// Minimal check that the effects work without ffmpeg or input files

use framefx::{
    effects::{EffectSpec, RgbColor},
    video::Frame,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing framefx effects");

    // Test 1: Color parsing
    println!("\n1. Parsing colors...");
    let green: RgbColor = "#00FF00".parse()?;
    let amber: RgbColor = "FFB000".parse()?;
    println!("   Key: {}  Light: {}", green, amber);

    // Test 2: Chroma key, solid green over blue
    println!("\n2. Chroma key...");
    let fg = Frame::new_filled(0, 160, 120, [0, 255, 0, 255]);
    let bg = Frame::new_filled(0, 80, 60, [0, 0, 255, 255]);
    let chroma = EffectSpec::ChromaKey {
        key_color: green,
        tolerance: 30.0,
        white_protect: 180.0,
    };
    let keyed = chroma.apply(fg.into_buffer(), Some(bg.into_buffer()))?.to_rgba8();
    assert!(keyed.pixels().all(|p| p.0 == [0, 0, 255, 255]));
    println!("   Keyed {}x{} frame onto the background", keyed.width(), keyed.height());

    // Test 3: Negative and reimage of a gradient
    println!("\n3. Negative and reimage...");
    let gradient = image::RgbaImage::from_fn(256, 64, |x, _| image::Rgba([x as u8, x as u8, x as u8, 255]));
    let negative = EffectSpec::Negative.apply(gradient.clone(), None)?;
    let lit = EffectSpec::NegativeReimage { light_color: amber }.apply(gradient, None)?;

    for (name, image) in [("minimal_negative.png", &negative), ("minimal_reimage.png", &lit)] {
        match image.save(name) {
            Ok(()) => println!("   Output saved to: {}", name),
            Err(e) => println!("   Could not save {}: {}", name, e),
        }
    }

    println!("\nAll effects ran.");
    Ok(())
}
