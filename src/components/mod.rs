use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Pay / retry button.
#[derive(Properties, PartialEq)]
pub struct ButtonProps {
    pub label: String,
    pub onclick: Callback<MouseEvent>,
    #[prop_or_default]
    pub disabled: bool,
}

#[function_component(Button)]
pub fn button(props: &ButtonProps) -> Html {
    html! {
        <button
            type="button"
            onclick={props.onclick.clone()}
            disabled={props.disabled}
            class="ysf-button"
        >
            { &props.label }
        </button>
    }
}

/// Controlled text input, used for the expiry date.
#[derive(Properties, PartialEq)]
pub struct TextInputProps {
    pub value: String,
    /// Emits the new value on each keystroke.
    pub oninput: Callback<String>,
    #[prop_or_default]
    pub placeholder: String,
    #[prop_or_default]
    pub maxlength: Option<u32>,
    #[prop_or_default]
    pub name: String,
}

#[function_component(TextInput)]
pub fn text_input(props: &TextInputProps) -> Html {
    let oninput = props.oninput.clone();
    html! {
        <input
            type="text"
            inputmode="numeric"
            class="ysf-text-input"
            name={props.name.clone()}
            value={props.value.clone()}
            placeholder={props.placeholder.clone()}
            maxlength={props.maxlength.map(|m| m.to_string())}
            oninput={Callback::from(move |e: InputEvent| {
                let input: HtmlInputElement = e.target_unchecked_into();
                oninput.emit(input.value());
            })}
        />
    }
}

/// Inline error line under the form.
#[derive(Properties, PartialEq)]
pub struct ErrorNoticeProps {
    #[prop_or_default]
    pub message: Option<String>,
}

#[function_component(ErrorNotice)]
pub fn error_notice(props: &ErrorNoticeProps) -> Html {
    match &props.message {
        Some(msg) => html! { <div class="ysf-error" aria-live="polite">{ msg }</div> },
        None => Html::default(),
    }
}

/// Final status line for a settled attempt.
#[derive(Properties, PartialEq)]
pub struct OutcomeNoticeProps {
    pub report: crate::outcome::OutcomeReport,
}

#[function_component(OutcomeNotice)]
pub fn outcome_notice(props: &OutcomeNoticeProps) -> Html {
    use crate::types::PaymentStatus;

    let report = &props.report;
    match report.status {
        PaymentStatus::Success => html! {
            <p class="ysf-success">
                { "Payment succeeded." }
                if let Some(tx) = &report.transaction_id {
                    { format!(" Transaction {}.", tx) }
                }
            </p>
        },
        PaymentStatus::Failed => html! {
            <ErrorNotice message={report.error.as_ref().map(|e| e.message.clone())} />
        },
        PaymentStatus::Pending | PaymentStatus::Processing => Html::default(),
    }
}
