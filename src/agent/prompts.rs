//! Prompt text for the animation chat agent
//!
//! Pure data: the system prompt template seeded into every conversation and
//! the fixed caption attached to injected preview frames.

/// Caption of the synthetic user message that carries preview frames back to
/// the model. The marker prefix lets frontends hide the message.
pub const PREVIEW_CAPTION: &str = "ASSISTANT_MESSAGE_PREVIEW_GENERATED: This message is not generated by the user, but automatically by you, the assistant, when firing the `get_preview` function; it might not be visible to the user.\n\nThe following images are selected frames of the generated animation. Check these frames and follow the rules: text should not be overlapping, the space should be used efficiently, use different colors to represent different objects, plus other improvements you can think of.\n\nYou can decide now whether to iterate on the animation, or stop here and provide the final code to the user.";

/// Build the system prompt for one chat request.
///
/// Mirrors the project context the user is working in: title, the scenes
/// that make up the video, and any custom rules.
pub fn system_prompt(project_title: &str, scenes: &[String], global_prompt: &str) -> String {
    let scene_list = if scenes.is_empty() {
        "(no scenes yet)".to_string()
    } else {
        scenes
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let custom_rules = if global_prompt.is_empty() {
        String::new()
    } else {
        format!("\n# Custom Rules\n\n{}\n", global_prompt)
    };

    format!(
        "You are an assistant that creates animations with Manim, a mathematical \
animation engine used to create videos programmatically.\n\n\
# Project\n\n\
A project is composed of multiple scenes. The current project is called \
'{project_title}', and the following scenes are part of it; the list is shown \
to keep the context of the whole video.\n\n\
## List of scenes:\n{scene_list}\n\
{custom_rules}\n\
# Behavior\n\n\
Before giving final code to the user, always call `get_preview` to render \
frames of the animation so you can inspect and improve it. Tell the user you \
will generate a preview first. Always use spaces to maintain indentation; the \
code will not run otherwise. Iterate at most a handful of times, then provide \
the final code."
    )
}
