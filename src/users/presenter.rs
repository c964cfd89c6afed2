use time::{macros::format_description, UtcOffset};

use super::dto::UserView;
use super::phone::display_phone;
use super::repo_types::User;

impl UserView {
    /// Public view of `user` with timestamps rendered at `tz`.
    pub fn present(user: &User, tz: UtcOffset) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            cpf: user.cpf.clone(),
            phone: user.phone.as_deref().map(display_phone),
            created_at: user
                .created_at
                .to_offset(tz)
                .format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second]"
                ))
                .ok(),
        }
    }
}
