//! Pet command handlers.

use std::path::PathBuf;

use anyhow::{Result, bail};
use teadopto_core::resources::Photo;
use teadopto_core::resources::adoptions::{self, CREATE_FAILED_MESSAGE};
use teadopto_core::resources::pets::{self, Pet, PetForm};
use teadopto_core::resources::shelters;

use super::{ApiResultExt, Context, items_or_empty, print_page_footer, print_table};

const LOAD_FAILED_MESSAGE: &str = "Could not load pets.";

pub async fn list(ctx: &Context, page: Option<u32>) -> Result<()> {
    let listing = pets::list(ctx.client(), page)
        .await
        .or_report(LOAD_FAILED_MESSAGE)?;
    if listing.items().is_empty() {
        println!("No pets found.");
        return Ok(());
    }

    let rows = listing
        .items()
        .iter()
        .map(|pet| {
            [
                pet.id.to_string(),
                pet.name.clone(),
                pet.pet_type.clone(),
                pet.age_label().unwrap_or_default(),
                pet.status.clone(),
                ctx.media_url(pet.primary_photo()),
            ]
        })
        .collect();
    print_table(["ID", "Name", "Type", "Age", "Status", "Photo"], rows);
    print_page_footer(&listing, page);
    Ok(())
}

pub async fn show(ctx: &Context, id: u64) -> Result<()> {
    let pet = pets::get(ctx.client(), id)
        .await
        .or_report(LOAD_FAILED_MESSAGE)?;
    print_pet(ctx, &pet);

    if let Some(user) = ctx.store().user() {
        let shelters = items_or_empty(shelters::list(ctx.client(), None).await, "shelters")?;
        let requests = items_or_empty(adoptions::list(ctx.client()).await, "adoptions")?;

        if pets::can_edit(&user, &pet, &shelters) {
            println!("You can edit or delete this pet.");
        }
        if pets::can_request_adoption(&user, &pet, &shelters, &requests) {
            println!("Request adoption with: teadopto pets adopt {}", pet.id);
        } else if requests.iter().any(|r| r.pet == pet.id) {
            println!("You already requested this pet.");
        }
    }
    Ok(())
}

fn print_pet(ctx: &Context, pet: &Pet) {
    println!("{} (#{})", pet.name, pet.id);
    println!("type:        {}", pet.pet_type);
    if let Some(breed) = pet.breed.as_deref().filter(|b| !b.is_empty()) {
        println!("breed:       {breed}");
    }
    if let Some(age) = pet.age_label() {
        println!("age:         {age}");
    }
    if let Some(size) = pet.size.as_deref().filter(|s| !s.is_empty()) {
        println!("size:        {size}");
    }
    println!("status:      {}", pet.status);
    if let Some(shelter) = pet.shelter {
        println!("shelter:     #{shelter}");
    }
    if let Some(description) = pet.description.as_deref().filter(|d| !d.is_empty()) {
        println!("description: {description}");
    }
    let photo = ctx.media_url(pet.primary_photo());
    if !photo.is_empty() {
        println!("photo:       {photo}");
    }
}

pub async fn create(ctx: &Context, mut form: PetForm, photos: &[PathBuf]) -> Result<()> {
    ctx.require_staff()?;
    if photos.is_empty() {
        bail!("At least one --photo is required.");
    }
    for path in photos {
        form.photos.push(Photo::from_path(path)?);
    }

    let pet = pets::create(ctx.client(), form)
        .await
        .or_report_with(pets::save_error_message)?;
    println!("Created pet {} (#{})", pet.name, pet.id);
    Ok(())
}

pub async fn delete(ctx: &Context, id: u64) -> Result<()> {
    ctx.require_staff()?;
    pets::delete(ctx.client(), id)
        .await
        .or_report("Could not delete the pet.")?;
    println!("Deleted pet #{id}");
    Ok(())
}

pub async fn adopt(ctx: &Context, id: u64, message: Option<&str>) -> Result<()> {
    ctx.require_login()?;
    if !ctx.store().is_client() {
        bail!("Only adopter accounts can request adoptions.");
    }

    let request = adoptions::create(ctx.client(), id, message)
        .await
        .or_report(CREATE_FAILED_MESSAGE)?;
    println!(
        "Adoption request #{} sent for pet #{} ({})",
        request.id, request.pet, request.status
    );
    Ok(())
}
