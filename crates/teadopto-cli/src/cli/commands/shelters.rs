//! Shelter command handlers.

use anyhow::Result;
use teadopto_core::resources::shelters;

use super::{ApiResultExt, Context, print_page_footer, print_table, text};

pub async fn list(ctx: &Context, page: Option<u32>) -> Result<()> {
    let listing = shelters::list(ctx.client(), page)
        .await
        .or_report("Could not load shelters.")?;
    if listing.items().is_empty() {
        println!("No shelters found.");
        return Ok(());
    }

    let rows = listing
        .items()
        .iter()
        .map(|shelter| {
            [
                shelter.id.to_string(),
                shelter.name.clone(),
                text(shelter.address.as_deref()),
                if shelter.verified { "yes" } else { "no" }.to_string(),
                ctx.media_url(shelter.display_photo()),
            ]
        })
        .collect();
    print_table(["ID", "Name", "Address", "Verified", "Photo"], rows);
    print_page_footer(&listing, page);
    Ok(())
}

pub async fn delete(ctx: &Context, id: u64) -> Result<()> {
    ctx.require_admin()?;
    shelters::delete(ctx.client(), id)
        .await
        .or_report("Could not delete the shelter.")?;
    println!("Deleted shelter #{id}");
    Ok(())
}
