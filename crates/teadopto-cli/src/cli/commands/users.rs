//! User account command handlers (admin).

use anyhow::Result;
use teadopto_core::resources::users;

use super::{ApiResultExt, Context, print_table, text};

pub async fn list(ctx: &Context) -> Result<()> {
    ctx.require_admin()?;
    let accounts = users::list(ctx.client())
        .await
        .or_report("Could not load users.")?
        .into_items();

    let rows = accounts
        .iter()
        .map(|u| {
            [
                u.id.to_string(),
                u.username.clone(),
                u.email.clone(),
                u.role.to_string(),
                text(u.phone.as_deref()),
            ]
        })
        .collect();
    print_table(["ID", "Username", "Email", "Role", "Phone"], rows);
    Ok(())
}

pub async fn delete(ctx: &Context, id: u64) -> Result<()> {
    ctx.require_admin()?;
    if ctx.store().user().is_some_and(|u| u.id == id) {
        anyhow::bail!("You cannot delete your own account.");
    }
    users::delete(ctx.client(), id)
        .await
        .or_report("Could not delete the user.")?;
    println!("Deleted user #{id}");
    Ok(())
}
