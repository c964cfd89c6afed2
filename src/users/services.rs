use anyhow::anyhow;
use tracing::{debug, info};

use super::dto::{ListQuery, ListResponse, UserPayload, UserView};
use super::password::hash_password;
use super::phone::normalize_phone;
use super::repo_types::{NewUser, User, UserChanges};
use super::validation::{
    check_email_unique, validate_create, validate_list_query, validate_update,
};
use crate::error::AppError;
use crate::state::AppState;

/// Path ids are numeric; anything else cannot name a record.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

pub async fn list_users(st: &AppState, query: &ListQuery) -> Result<ListResponse, AppError> {
    let (filter, page) = validate_list_query(query)?;

    let total = st.users.count(&filter).await?;
    let rows = st.users.list(&filter, page).await?;
    debug!(total, returned = rows.len(), page = page.page, "users listed");

    let tz = st.config.timezone;
    Ok(ListResponse {
        data: rows.iter().map(|u| UserView::present(u, tz)).collect(),
        total,
    })
}

pub async fn create_user(st: &AppState, payload: UserPayload) -> Result<UserView, AppError> {
    let mut errors = validate_create(&payload);
    check_email_unique(st.users.as_ref(), payload.email.as_deref(), None, &mut errors).await?;
    errors.into_result()?;

    let (Some(name), Some(email), Some(password)) = (payload.name, payload.email, payload.password)
    else {
        return Err(anyhow!("validated create payload is missing required fields").into());
    };

    let user = st
        .users
        .insert(NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
            cpf: payload.cpf,
            phone: normalize_phone(payload.phone),
        })
        .await?;

    info!(user_id = user.id, "user created");
    Ok(UserView::present(&user, st.config.timezone))
}

pub async fn find_user(st: &AppState, id: i64) -> Result<User, AppError> {
    st.users.find_by_id(id).await?.ok_or(AppError::NotFound)
}

pub async fn get_user(st: &AppState, id: i64) -> Result<UserView, AppError> {
    let user = find_user(st, id).await?;
    Ok(UserView::present(&user, st.config.timezone))
}

/// Applies `payload` to `existing`, which the caller has already looked up.
pub async fn update_user(
    st: &AppState,
    existing: User,
    payload: UserPayload,
) -> Result<UserView, AppError> {
    let id = existing.id;
    let mut errors = validate_update(&payload);
    check_email_unique(
        st.users.as_ref(),
        payload.email.as_deref(),
        Some(id),
        &mut errors,
    )
    .await?;
    errors.into_result()?;

    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;
    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
        password_hash,
        cpf: payload.cpf,
        phone: normalize_phone(payload.phone),
    };

    if !st.users.update(id, changes).await? {
        return Err(AppError::NotFound);
    }
    let user = find_user(st, id).await?;

    info!(user_id = user.id, "user updated");
    Ok(UserView::present(&user, st.config.timezone))
}

pub async fn delete_user(st: &AppState, id: i64) -> Result<(), AppError> {
    find_user(st, id).await?;
    if !st.users.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = id, "user deleted");
    Ok(())
}
