//! Cloud flow: populate a 10x10 product grid in one flush, then write
//! per-column and per-row SUM margins in one flush each.

use std::path::Path;

use anyhow::{Context, Result};
use sheetpilot_gsheets::{
    product_grid, write_column_sums, write_row_sums, Client, ServiceAccountKey, ValueInputOption,
};

pub async fn run(credentials: &Path, title: &str) -> Result<()> {
    println!("Running Google Sheets demo");

    let key = ServiceAccountKey::from_file(credentials)
        .context("failed to load the service-account key")?;
    let client = Client::authorize(&key).await.context("authorization failed")?;

    let spreadsheet = client
        .open_by_title(title)
        .await
        .with_context(|| format!("could not open spreadsheet '{title}'"))?;
    let sheet = spreadsheet.sheet1();

    sheet.clear().await?;

    // 10x10 grid of row*col products: one fetch, one flush
    let mut grid = sheet.range("A1:J10").await?;
    product_grid(&mut grid);
    sheet.update_cells(&grid, ValueInputOption::Raw).await?;

    // per-column sums in the margin row below the grid
    let mut column_sums = sheet.range("A12:J12").await?;
    write_column_sums(&mut column_sums, 0, 9);
    sheet
        .update_cells(&column_sums, ValueInputOption::UserEntered)
        .await?;

    // per-row sums in the margin column right of the grid
    let mut row_sums = sheet.range("L1:L10").await?;
    write_row_sums(&mut row_sums, 0, 9);
    sheet
        .update_cells(&row_sums, ValueInputOption::UserEntered)
        .await?;

    println!("Google Sheets demo complete");
    Ok(())
}
