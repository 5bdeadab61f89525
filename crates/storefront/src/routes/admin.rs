//! Product management route handlers (login required).
//!
//! The add/edit forms are multipart because of the image upload. Text
//! fields are validated first; the image is required on create, optional on
//! edit (replacing it deletes the old file).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use clementine_core::ProductId;

use crate::db::products::{ProductInput, ProductRepository};
use crate::error::{AppError, Result};
use crate::forms::{FieldError, ValidProduct, validate_product};
use crate::middleware::RequireAuth;
use crate::routes::products::ProductView;
use crate::services::uploads;
use crate::state::AppState;

// =============================================================================
// Multipart form handling
// =============================================================================

/// Raw fields read out of the product multipart form.
#[derive(Debug, Default)]
struct ProductForm {
    product_id: Option<i32>,
    title: String,
    price: String,
    description: String,
    /// Declared content type and bytes, when a file was attached.
    image: Option<(String, Vec<u8>)>,
}

/// Drain a product multipart submission into its fields.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        // Taken as owned up front: reading the field body consumes it
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "product_id" => {
                form.product_id = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .parse()
                    .ok();
            }
            "title" => {
                form.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "price" => {
                form.price = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "description" => {
                form.description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers submit an empty file part when nothing was chosen
                if !bytes.is_empty() {
                    form.image = Some((content_type, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Validate the form, including the image rules for create vs. edit.
fn validate_form(form: &ProductForm, image_required: bool) -> std::result::Result<ValidProduct, Vec<FieldError>> {
    let mut errors = match validate_product(&form.title, &form.price, &form.description) {
        Ok(valid) => return check_image(form, image_required).map(|()| valid),
        Err(errors) => errors,
    };

    if let Err(mut image_errors) = check_image(form, image_required) {
        errors.append(&mut image_errors);
    }

    Err(errors)
}

fn check_image(form: &ProductForm, image_required: bool) -> std::result::Result<(), Vec<FieldError>> {
    match &form.image {
        Some((content_type, _)) if uploads::extension_for(content_type).is_none() => {
            Err(vec![FieldError {
                field: "image",
                message: "Only png, jpg and jpeg images are supported!".to_owned(),
            }])
        }
        None if image_required => Err(vec![FieldError {
            field: "image",
            message: "Please upload an image!".to_owned(),
        }]),
        _ => Ok(()),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Admin product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub products: Vec<ProductView>,
    pub logged_in: bool,
}

/// Add/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/edit_product.html")]
pub struct EditProductTemplate {
    pub editing: bool,
    pub product_id: Option<ProductId>,
    pub title: String,
    pub price: String,
    pub description: String,
    pub errors: Vec<FieldError>,
    pub logged_in: bool,
}

fn form_retry(
    editing: bool,
    product_id: Option<ProductId>,
    form: &ProductForm,
    errors: Vec<FieldError>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        EditProductTemplate {
            editing,
            product_id,
            title: form.title.clone(),
            price: form.price.clone(),
            description: form.description.clone(),
            errors,
            logged_in: true,
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// List the current user's product listings.
pub async fn products(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool())
        .list_by_owner(current.id)
        .await?;

    Ok(AdminProductsTemplate {
        products: products.iter().map(ProductView::from).collect(),
        logged_in: true,
    })
}

/// Display the empty add-product form.
pub async fn add_product_page(RequireAuth(_current): RequireAuth) -> impl IntoResponse {
    EditProductTemplate {
        editing: false,
        product_id: None,
        title: String::new(),
        price: String::new(),
        description: String::new(),
        errors: Vec::new(),
        logged_in: true,
    }
}

/// Handle the add-product form submission.
pub async fn add_product(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_product_form(multipart).await?;

    let valid = match validate_form(&form, true) {
        Ok(valid) => valid,
        Err(errors) => return Ok(form_retry(false, None, &form, errors)),
    };

    // Image presence and type were validated above
    let Some((content_type, bytes)) = &form.image else {
        return Err(AppError::BadRequest("missing image".to_owned()));
    };
    let image_url = state.images().save(content_type, bytes).await?;

    ProductRepository::new(state.pool())
        .create(
            current.id,
            &ProductInput {
                title: valid.title,
                price: valid.price,
                description: valid.description,
                image_url,
            },
        )
        .await?;

    Ok(Redirect::to("/admin/products").into_response())
}

/// Display the edit form, prefilled from the product.
pub async fn edit_product_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if product.owner_id != current.id {
        return Err(AppError::Forbidden(format!(
            "product {id} belongs to another user"
        )));
    }

    Ok(EditProductTemplate {
        editing: true,
        product_id: Some(product.id),
        title: product.title,
        price: product.price.amount.to_string(),
        description: product.description,
        errors: Vec::new(),
        logged_in: true,
    }
    .into_response())
}

/// Handle the edit-product form submission.
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_product_form(multipart).await?;
    let Some(id) = form.product_id.map(ProductId::new) else {
        return Err(AppError::BadRequest("missing product_id".to_owned()));
    };

    let valid = match validate_form(&form, false) {
        Ok(valid) => valid,
        Err(errors) => return Ok(form_retry(true, Some(id), &form, errors)),
    };

    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if product.owner_id != current.id {
        return Err(AppError::Forbidden(format!(
            "product {id} belongs to another user"
        )));
    }

    let image_url = match &form.image {
        Some((content_type, bytes)) => state.images().save(content_type, bytes).await?,
        None => product.image_url.clone(),
    };

    let updated = repo
        .update(
            id,
            current.id,
            &ProductInput {
                title: valid.title,
                price: valid.price,
                description: valid.description,
                image_url: image_url.clone(),
            },
        )
        .await?;

    // Drop the replaced file only once the row points at the new one
    if updated && form.image.is_some() {
        state.images().delete(&product.image_url).await;
    }

    Ok(Redirect::to("/admin/products").into_response())
}

/// Delete-product form data.
#[derive(Debug, Deserialize)]
pub struct DeleteProductForm {
    pub product_id: i32,
}

/// Handle the delete-product form submission.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<DeleteProductForm>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(form.product_id);
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if repo.delete(id, current.id).await? {
        state.images().delete(&product.image_url).await;
    }

    Ok(Redirect::to("/admin/products"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(image: Option<(&str, &[u8])>) -> ProductForm {
        ProductForm {
            product_id: None,
            title: "Teapot".to_owned(),
            price: "24.99".to_owned(),
            description: "A very nice teapot.".to_owned(),
            image: image.map(|(ct, bytes)| (ct.to_owned(), bytes.to_vec())),
        }
    }

    #[test]
    fn test_create_requires_an_image() {
        let errors = validate_form(&form(None), true).unwrap_err();
        assert_eq!(errors.first().unwrap().field, "image");
        assert_eq!(errors.first().unwrap().message, "Please upload an image!");
    }

    #[test]
    fn test_edit_accepts_missing_image() {
        assert!(validate_form(&form(None), false).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_image_type() {
        let errors = validate_form(&form(Some(("image/gif", b"GIF89a"))), true).unwrap_err();
        assert_eq!(
            errors.first().unwrap().message,
            "Only png, jpg and jpeg images are supported!"
        );
    }

    #[test]
    fn test_accepts_png_upload() {
        let valid = validate_form(&form(Some(("image/png", b"\x89PNG"))), true).unwrap();
        assert_eq!(valid.title, "Teapot");
        assert_eq!(valid.price.to_string(), "24.99");
    }

    #[test]
    fn test_field_and_image_errors_combine() {
        let bad = ProductForm {
            title: "ab".to_owned(),
            price: "free".to_owned(),
            description: "short".to_owned(),
            ..form(None)
        };
        let errors = validate_form(&bad, true).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "price", "description", "image"]);
    }
}
