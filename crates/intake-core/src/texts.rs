//! User-facing copy. Button labels double as the trigger phrases the form matches.

use std::borrow::Cow;

use crate::store::Application;

// ============== Buttons / trigger phrases ==============

pub const START_FORM_BUTTON: &str = "Оставить заявку";
pub const CONFIRM_BUTTON: &str = "Да, отправить";
pub const RESTART_BUTTON: &str = "Нет, начать заново";

// ============== Commands ==============

pub const WELCOME: &str = "Добро пожаловать! 👋\n\
Я помогу вам оставить заявку на консультацию.\n\
Нажмите кнопку ниже, чтобы начать.";

pub const HELP: &str = "Я бот для сбора заявок на консультацию. 📝\n\
Вы можете оставить заявку, указав ваше имя, телефон и тему консультации.\n\
Для начала, используйте команду /start или нажмите кнопку 'Оставить заявку'.";

// ============== Form prompts ==============

pub const ASK_NAME: &str = "Пожалуйста, введите ваше имя:";
pub const ASK_PHONE: &str = "Спасибо! Теперь введите ваш номер телефона:";
pub const ASK_TOPIC: &str = "Отлично! Укажите тему консультации:";
pub const RESTARTED: &str = "Хорошо, давайте начнем заново. Введите ваше имя:";
pub const USE_BUTTONS: &str =
    "Пожалуйста, используйте кнопки для ответа: 'Да, отправить' или 'Нет, начать заново'.";

pub const SUBMITTED: &str = "Спасибо! Ваша заявка принята. Мы скоро с вами свяжемся. ✅";
pub const SUBMIT_FAILED: &str =
    "Произошла ошибка при сохранении вашей заявки. Пожалуйста, попробуйте еще раз позже. ⚠️";
pub const ANOTHER_ONE: &str =
    "Вы можете оставить еще одну заявку или использовать команду /help.";

/// Longest rendering of one field inside a summary, in UTF-16 code units.
///
/// Three clipped fields plus the surrounding copy stay under Telegram's 4096 limit.
/// Stored values are never clipped.
pub const MAX_FIELD_DISPLAY: usize = 1000;

fn clip(field: &str) -> Cow<'_, str> {
    if field.encode_utf16().count() <= MAX_FIELD_DISPLAY {
        return Cow::Borrowed(field);
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in field.chars() {
        used += ch.len_utf16();
        if used > MAX_FIELD_DISPLAY - 1 {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    Cow::Owned(out)
}

pub fn confirmation_summary(name: &str, phone: &str, topic: &str) -> String {
    let (name, phone, topic) = (clip(name), clip(phone), clip(topic));
    format!(
        "Спасибо! Давайте проверим данные:\n\
         Имя: {name}\n\
         Телефон: {phone}\n\
         Тема: {topic}\n\n\
         Все верно?"
    )
}

/// Summary relayed to notification targets. `entry_point` names the bot the
/// application came through.
pub fn admin_notification(entry_point: &str, app: &Application) -> String {
    format!(
        "📬 Новая заявка на консультацию (через @{entry_point}):\n\
         👤 Имя: {}\n\
         📞 Телефон: {}\n\
         📌 Тема: {}",
        clip(&app.name),
        clip(&app.phone),
        clip(&app.topic)
    )
}
