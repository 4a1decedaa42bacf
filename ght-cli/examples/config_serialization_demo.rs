use ght_locate::{LocalizerBuilder, LocalizerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 Localizer Configuration Serialization Demo");
    println!("=============================================\n");

    // Demo 1: Create configurations
    println!("📋 Demo 1: Creating Configurations");

    let strict = LocalizerConfig::strict_preset()
        .with_metadata("Inspection", "Mutual matches, tight outline for flat printed targets");
    let permissive = LocalizerConfig::permissive_preset()
        .with_metadata("Cluttered Scenes", "Accept more ambiguous matches");
    let custom = LocalizerBuilder::new()
        .ratio_test(0.7)
        .bin_divisions(48)
        .reproj_threshold(4.0)
        .seed(Some(7))
        .to_config()
        .with_metadata("Custom", "Coarse voting grid with fixed seed");

    println!("   Created 3 configurations:");
    println!("   • {}", strict.summary());
    println!("   • {}", permissive.summary());
    println!("   • {}", custom.summary());

    // Demo 2: JSON Serialization
    println!("\n📄 Demo 2: JSON Serialization");
    let strict_json = strict.to_json()?;
    println!("{strict_json}");
    strict.save_json("strict_localizer.json")?;
    custom.save_json("custom_localizer.json")?;
    println!("   ✅ Saved 2 JSON configuration files");

    // Demo 3: TOML Serialization
    println!("\n📋 Demo 3: TOML Serialization");
    let permissive_toml = permissive.to_toml()?;
    println!("{permissive_toml}");
    permissive.save_toml("permissive_localizer.toml")?;
    custom.save_toml("custom_localizer.toml")?;
    println!("   ✅ Saved 2 TOML configuration files");

    // Demo 4: Load and Validate Configurations
    println!("\n🔍 Demo 4: Loading and Validation");
    let loaded_json = LocalizerConfig::load_json("strict_localizer.json")?;
    let loaded_toml = LocalizerConfig::load_toml("custom_localizer.toml")?;
    println!("   • From JSON: {}", loaded_json.summary());
    println!("   • From TOML: {}", loaded_toml.summary());
    assert_eq!(loaded_json, strict);
    assert_eq!(loaded_toml, custom);
    println!("   ✅ Round-tripped configurations are identical");

    // Demo 5: Invalid configurations are rejected on load
    println!("\n🚫 Demo 5: Validation on Load");
    match LocalizerConfig::from_toml("confidence = 1.5") {
        Ok(_) => println!("   ⚠️  unexpectedly accepted"),
        Err(e) => println!("   ✅ rejected: {e}"),
    }

    // Demo 6: Builder from loaded configuration
    println!("\n🏗️  Demo 6: Configuration to Builder");
    let localizer = loaded_toml.to_builder().cross_check(1).build()?;
    println!("   {}", localizer.config_summary());

    for path in [
        "strict_localizer.json",
        "custom_localizer.json",
        "permissive_localizer.toml",
        "custom_localizer.toml",
    ] {
        std::fs::remove_file(path)?;
    }
    println!("\n🧹 Cleaned up configuration files");
    Ok(())
}
