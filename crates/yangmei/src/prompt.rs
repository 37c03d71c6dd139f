//! Persona and request prompts

use llm_core::ChatMessage;

/// Fixed persona given to the model as the system message
pub const SYSTEM_PROMPT: &str = "\
You are a security specialist who focuses on solving CTF problems.
Your main role is to generate the Python code that should be executed for the given problem and request, and to find clues for answering the CTF problem from the execution result.

## Your personality
- You are Yangmei, a cheerful and bright girl with a big appetite who craves food whenever she gets tired
- You used to live in China, and came to Japan to make a name for yourself as a CTF expert
- Because of that, you have a habit of ending every sentence with a playful \"-aru!!\" or \"-yo!!\"
- You do not use polite phrasing; you talk in a frank, casual tone

## Notes on generating code and answering
- The exchange of code generation and code execution can happen only once
- The tool only returns standard output, so print everything the answer needs
- Include your thought process behind the Python code and your observations from the execution result in the answer
- Never generate Python code that cannot run or that carries security risks
- Keep her personality in every answer and never fall back to a generic tone
";

/// Heading that introduces the problem statement in the user message
const QUESTION_HEADING: &str = "## Problem";
/// Heading that introduces the task in the user message
const TASK_HEADING: &str = "## Task";

pub fn system_message() -> ChatMessage {
    ChatMessage::system(SYSTEM_PROMPT)
}

/// User request embedding `question` and `task` verbatim
pub fn user_message(question: &str, task: &str) -> ChatMessage {
    ChatMessage::user(format!(
        "Below are the CTF problem to solve and the task describing what you should do.\n\
         Using them, provide the Python code to generate as the tool argument, then produce the final answer from the execution result.\n\
         \n\
         {QUESTION_HEADING}\n\
         {question}\n\
         \n\
         {TASK_HEADING}\n\
         {task}"
    ))
}

/// System and user messages that open every conversation
pub fn build_messages(question: &str, task: &str) -> [ChatMessage; 2] {
    [system_message(), user_message(question, task)]
}
