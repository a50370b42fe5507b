//! Home figures and the admin panel.

use anyhow::{Result, bail};
use teadopto_core::config::Config;
use teadopto_core::resources::dashboard;

use super::Context;

pub async fn stats(ctx: &Context) -> Result<()> {
    let stats = dashboard::home_stats(ctx.client(), ctx.store().is_authenticated()).await;
    if let Some(error) = stats.error() {
        bail!(error);
    }

    println!("Pets:      {}", stats.pets);
    println!("Shelters:  {}", stats.shelters);
    if let Some(adoptions) = stats.adoptions {
        println!("Adoptions: {adoptions}");
    }

    match dashboard::featured_pets(ctx.client()).await {
        Ok(pets) if !pets.is_empty() => {
            println!();
            println!("Looking for a home:");
            for pet in pets {
                match pet.age_label() {
                    Some(age) => println!("  #{} {} ({}, {age})", pet.id, pet.name, pet.pet_type),
                    None => println!("  #{} {} ({})", pet.id, pet.name, pet.pet_type),
                }
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "featured pets unavailable"),
    }
    Ok(())
}

pub async fn overview(ctx: &Context) -> Result<()> {
    ctx.require_admin()?;
    let figures = dashboard::admin_overview(ctx.client()).await;
    println!("Users:     {}", figures.users);
    println!("Pets:      {}", figures.pets);
    println!("Shelters:  {}", figures.shelters);
    println!("Adoptions: {}", figures.adoptions);
    Ok(())
}

pub fn admin_url(config: &Config) -> Result<()> {
    println!("{}", config.admin_url()?);
    Ok(())
}
