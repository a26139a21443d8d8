use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckboxOption {
    pub text: TextObject,
    pub value: String,
}

impl CheckboxOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self { text: TextObject::plain(value.clone()), value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckboxesElement {
    pub action_id: String,
    pub options: Vec<CheckboxOption>,
}

impl CheckboxesElement {
    pub fn new<I, S>(action_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action_id: action_id.into(),
            options: values.into_iter().map(CheckboxOption::new).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button(ButtonElement),
    Checkboxes(CheckboxesElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { block_id: String, text: TextObject },
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ActionElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks
            .push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ActionElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(ActionElement::Button(button));
        self
    }

    pub fn checkboxes(&mut self, checkboxes: CheckboxesElement) -> &mut Self {
        self.elements.push(ActionElement::Checkboxes(checkboxes));
        self
    }

    fn build(self) -> Vec<ActionElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Times and restaurants a participant may pick from, as configured through
/// the external settings surface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainMenu {
    pub times: Vec<String>,
    pub restaurants: Vec<String>,
}

/// Everything the closing announcement needs, already rendered to display
/// names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClosingSummary {
    pub time: Option<String>,
    pub restaurant: Option<String>,
    pub time_dissatisfied: Vec<String>,
    pub restaurant_dissatisfied: Vec<String>,
}

pub fn participation_prompt(food_emoji: &str, train_emoji: &str, joke: &str) -> MessageTemplate {
    MessageBuilder::new("Building up new lunch train")
        .header(
            "train.open.header.v1",
            format!("Building up new lunch train {food_emoji}{train_emoji}"),
        )
        .section("train.open.question.v1", |section| {
            section.mrkdwn("Today are you coming to lunch?");
        })
        .context("train.open.joke.v1", |context| {
            context.plain(joke);
        })
        .actions("train.open.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new("confirm_train_participation", "Sure!")
                        .style(ButtonStyle::Primary)
                        .value("train_participation"),
                )
                .button(
                    ButtonElement::new("reject_train_participation", "No I hate you!")
                        .style(ButtonStyle::Danger)
                        .value("train_participation"),
                );
        })
        .build()
}

pub fn closing_announcement(summary: &ClosingSummary) -> MessageTemplate {
    let mut text = match (&summary.time, &summary.restaurant) {
        (Some(time), Some(restaurant)) => {
            format!("Today the train will start at {time} directed to {restaurant}.")
        }
        (Some(time), None) => {
            format!("Today the train will start at {time}; the destination is still open.")
        }
        (None, Some(restaurant)) => {
            format!("Today the train is directed to {restaurant}; the departure time is still open.")
        }
        (None, None) => "The train is closed with no votes recorded today.".to_owned(),
    };
    if !summary.time_dissatisfied.is_empty() {
        text.push_str(&format!(
            "\n{} are not liking the time.",
            summary.time_dissatisfied.join(", ")
        ));
    }
    if !summary.restaurant_dissatisfied.is_empty() {
        text.push_str(&format!(
            "\n{} are not liking the restaurant.",
            summary.restaurant_dissatisfied.join(", ")
        ));
    }

    MessageBuilder::new("Closing lunch train")
        .header("train.close.header.v1", ":warning:The train is closed! Booking needed:warning:")
        .section("train.close.summary.v1", |section| {
            section.mrkdwn(text);
        })
        .actions("train.close.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new("confirm_train_booking", "Booking...")
                        .style(ButtonStyle::Primary)
                        .value("train_booking"),
                )
                .button(
                    ButtonElement::new("confirm_train_booking_problems", "Booking problems")
                        .style(ButtonStyle::Danger)
                        .value("train_booking_problems"),
                );
        })
        .build()
}

pub fn boarding_confirmation(display_name: &str, menu: &TrainMenu) -> MessageTemplate {
    MessageBuilder::new(format!("{display_name} is on the lunch train"))
        .section("train.board.welcome.v1", |section| {
            section.mrkdwn(format!(
                "*You are on the train, {display_name}!* Pick the times and restaurants that work for you."
            ));
        })
        .actions("train.board.times.v1", |actions| {
            actions.checkboxes(CheckboxesElement::new("select_lunch_times", menu.times.clone()));
        })
        .actions("train.board.restaurants.v1", |actions| {
            actions
                .checkboxes(CheckboxesElement::new("select_restaurants", menu.restaurants.clone()));
        })
        .build()
}

pub fn decline_confirmation(display_name: &str) -> MessageTemplate {
    MessageBuilder::new(format!("{display_name} is off the lunch train"))
        .section("train.leave.summary.v1", |section| {
            section.mrkdwn(format!(
                "You are off the train, {display_name}. Board again any time before it closes."
            ));
        })
        .build()
}

pub fn selection_confirmation(kind_label: &str, selected: &[String]) -> MessageTemplate {
    let rendered = if selected.is_empty() { "nothing yet".to_owned() } else { selected.join(", ") };
    MessageBuilder::new(format!("Selection saved: {rendered}"))
        .section("train.selection.summary.v1", |section| {
            section.mrkdwn(format!("*{kind_label} saved:* {rendered}"));
        })
        .build()
}

pub fn error_reply(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("train.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("train.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_ids(template: &MessageTemplate) -> Vec<String> {
        template
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { elements, .. } => Some(elements),
                _ => None,
            })
            .flatten()
            .filter_map(|element| match element {
                ActionElement::Button(button) => Some(button.action_id.clone()),
                ActionElement::Checkboxes(_) => None,
            })
            .collect()
    }

    #[test]
    fn participation_prompt_offers_both_choices_and_the_joke() {
        let template = participation_prompt(":pizza:", ":train2:", "An SQL query walks into a bar.");

        assert!(template.blocks.iter().any(|block| matches!(
            block,
            Block::Header { text: TextObject::Plain { text }, .. }
                if text.contains(":pizza:") && text.contains(":train2:")
        )));
        assert!(template.blocks.iter().any(|block| matches!(
            block,
            Block::Context { elements, .. }
                if elements.iter().any(|element| matches!(
                    element,
                    TextObject::Plain { text } if text.contains("SQL")
                ))
        )));
        assert_eq!(
            button_ids(&template),
            vec!["confirm_train_participation", "reject_train_participation"]
        );
    }

    #[test]
    fn closing_announcement_mentions_dissatisfied_users_only_when_present() {
        let unanimous = closing_announcement(&ClosingSummary {
            time: Some("12:00".to_owned()),
            restaurant: Some("Trattoria".to_owned()),
            ..ClosingSummary::default()
        });
        assert!(summary_text(&unanimous).contains("12:00"));
        assert!(!summary_text(&unanimous).contains("not liking"));

        let contested = closing_announcement(&ClosingSummary {
            time: Some("12:00".to_owned()),
            restaurant: Some("Trattoria".to_owned()),
            time_dissatisfied: vec!["Ada".to_owned(), "Grace".to_owned()],
            restaurant_dissatisfied: vec!["Linus".to_owned()],
        });
        let text = summary_text(&contested);
        assert!(text.contains("Ada, Grace are not liking the time."));
        assert!(text.contains("Linus are not liking the restaurant."));
    }

    #[test]
    fn closing_announcement_handles_partially_resolved_cycles() {
        let time_only = closing_announcement(&ClosingSummary {
            time: Some("12:00".to_owned()),
            ..ClosingSummary::default()
        });
        assert!(summary_text(&time_only).contains("destination is still open"));

        let nothing = closing_announcement(&ClosingSummary::default());
        assert!(summary_text(&nothing).contains("no votes recorded"));
    }

    #[test]
    fn boarding_confirmation_renders_menu_checkboxes() {
        let menu = TrainMenu {
            times: vec!["12:00".to_owned(), "12:45".to_owned()],
            restaurants: vec!["Trattoria".to_owned()],
        };
        let template = boarding_confirmation("Ada", &menu);

        let checkbox_ids: Vec<_> = template
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { elements, .. } => Some(elements),
                _ => None,
            })
            .flatten()
            .filter_map(|element| match element {
                ActionElement::Checkboxes(checkboxes) => Some(checkboxes.action_id.clone()),
                ActionElement::Button(_) => None,
            })
            .collect();
        assert_eq!(checkbox_ids, vec!["select_lunch_times", "select_restaurants"]);
    }

    #[test]
    fn blocks_serialize_with_slack_type_tags() {
        let template = error_reply("something went sideways", "req-9");
        let rendered = serde_json::to_value(&template).expect("serialize template");

        assert_eq!(rendered["blocks"][0]["type"], "section");
        assert_eq!(rendered["blocks"][1]["type"], "context");
        assert_eq!(rendered["blocks"][0]["text"]["type"], "mrkdwn");
    }

    fn summary_text(template: &MessageTemplate) -> String {
        template
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text: TextObject::Mrkdwn { text }, .. } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
