//! Built-in content: the prompt-engineering course and the static texts of
//! the welcome and Code Wizards screens.

use crate::domain::{Lesson, LessonBlock, Quiz};

pub const WELCOME_TITLE: &str = "Welcome to AI Adventure Land!";
pub const WELCOME_TEXT: &str = "Hi there, future AI explorer! I'm Gemi, your friendly guide. Ready to go on an amazing adventure and learn about Artificial Intelligence? Pick a fun activity from the menu to get started!";

fn p(text: &str) -> LessonBlock {
  LessonBlock::Paragraph(text.into())
}

fn ex(text: &str) -> LessonBlock {
  LessonBlock::PromptExample(text.into())
}

fn steps(items: &[&str]) -> LessonBlock {
  LessonBlock::Steps(items.iter().map(|s| s.to_string()).collect())
}

fn quiz(question: &str, options: [&str; 4], correct: usize, explanation: &str) -> Option<Quiz> {
  Some(Quiz {
    question: question.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
    correct_option_index: correct,
    explanation: explanation.into(),
  })
}

/// The default course. Every lesson but the last gates the next one.
pub fn builtin_lessons() -> Vec<Lesson> {
  let lessons = vec![
    ("What is a Prompt?", vec![
      p("Welcome to your first lesson! 🎉 A \"prompt\" is just a fancy word for the instructions you give to an AI. Think of the AI as a super-smart robot helper. It can draw, write, and code, but it needs you to tell it what to do!"),
      p("Being good at prompting is like learning how to give the best, clearest instructions so your robot helper understands you perfectly every time. The better your instructions, the better the AI's creation will be!"),
    ], quiz(
      "What is a 'prompt'?",
      ["A special robot dance", "A type of computer bug", "Instructions you give to an AI", "A new video game"],
      2,
      "That's right! A prompt is simply a command or question you give to an AI to tell it what to do.",
    )),
    ("The Magic Words for Images", vec![
      p("Want an AI to draw something? You need to be a super good describer! 👩‍🎨 The best image prompts include:"),
      steps(&[
        "Subject: What is the main thing in the picture? (e.g., a dragon, a robot)",
        "Adjectives: Describe your subject! (e.g., a happy, sparkly dragon)",
        "Action: What is the subject doing? (e.g., eating a taco)",
        "Style: How should it look? (e.g., cartoon style, watercolor painting)",
      ]),
      ex("A happy, sparkly dragon eating a giant taco, cartoon style."),
    ], quiz(
      "Which of these is the MOST descriptive prompt for generating an image?",
      ["A cat", "A drawing of a cat", "A fluffy orange cat sleeping on a pile of books, digital art", "Cat picture"],
      2,
      "Exactly! The best prompts are super descriptive, telling the AI the subject, what it's doing, and the style.",
    )),
    ("Let's Write a Story", vec![
      p("You can start an amazing story with just one prompt. To get the best story, tell the AI the key ingredients:"),
      steps(&[
        "Character: Who is the story about? (e.g., a brave little squirrel)",
        "Setting: Where does it happen? (e.g., in a magical forest)",
        "Plot: What is the adventure? (e.g., who is looking for a legendary giant acorn)",
      ]),
      p("Try giving the AI these pieces and see what adventure it creates for you! Then you can continue the story together in the Story Time module."),
      ex("Write a short story about a brave little squirrel named Squeaky who lives in a magical forest and is looking for the legendary Giant Acorn of Wisdom."),
    ], quiz(
      "What are the three key ingredients for a good story prompt?",
      ["Character, Setting, and Plot", "Beginning, Middle, and End", "Action, Comedy, and Drama", "Pictures, Sounds, and Words"],
      0,
      "You got it! Giving the AI a Character, Setting, and Plot is the secret to starting an awesome story.",
    )),
    ("AI, the Math Whiz", vec![
      p("Stuck on a math problem? 🧠 An AI can be a great helper, but it needs the *exact* problem. Don't just say \"help me with math.\""),
      p("Always give it the full problem, just like it's written in your book. You can even ask it to explain the steps to solve it!"),
      ex("If a pizza has 8 slices and I eat 3, what fraction of the pizza is left? Explain how you got the answer."),
    ], quiz(
      "What's the best way to ask an AI for help with a math problem?",
      ["'I'm bad at math'", "'Help me with homework'", "'Can you do math?'", "'What is 58 + 93? Explain the steps.'"],
      3,
      "Perfect! Giving the AI the exact problem and asking for an explanation is the most helpful way to learn.",
    )),
    ("Chatting with AI", vec![
      p("Sometimes you just want to talk or ask questions. You can chat with an AI like Gemini or ChatGPT. The secret is to ask clear questions. 💬"),
      ex("Why is the sky blue?"),
      ex("Okay, but why is the sky red or orange during a sunset?"),
    ], quiz(
      "What's the secret to a great chat with an AI?",
      ["Typing as fast as you can", "Asking clear questions", "Using only emojis", "Never asking a follow-up"],
      1,
      "Yes! Clear questions get clear answers, and you can always ask a follow-up to learn more.",
    )),
    ("Supercharged Prompts", vec![
      p("Ready for a power-up? 🚀 You can make your prompts even better by telling the AI to act like someone or something. This is called setting a \"persona.\""),
      ex("Act like a pirate and explain why volcanoes erupt."),
      ex("You are a grumpy cat. Write a poem about why rain is annoying."),
    ], quiz(
      "What is it called when you tell the AI to act like someone, like a pirate?",
      ["A password", "A persona", "A puzzle", "A podcast"],
      1,
      "Arr, that's right! Giving the AI a persona changes how it talks and makes answers extra fun.",
    )),
    ("Making Movies with Words", vec![
      p("Did you know some AIs, like Veo, can create videos from words? 🎬 It's like image generation but for movies! You describe a scene and what's happening in it."),
      ex("A baby elephant playfully chasing a butterfly through a field of tall grass, sunny day, cinematic shot."),
      ex("A futuristic car flying through a city with glowing buildings at night, camera follows the car from behind."),
    ], quiz(
      "What should a good video prompt describe?",
      ["Only the title of the movie", "The scene and what is happening in it", "How long the video file is", "Your favorite color"],
      1,
      "Great job! Video prompts work best when they paint the scene and the action, just like image prompts.",
    )),
    ("From Idea to Movie!", vec![
      p("Let's put it all together to plan a mini-movie! 🍿 Here's a simple way to do it:"),
      steps(&[
        "Step 1: Get a Story. Use the story prompt skill to get a short story from an AI.",
        "Step 2: Break it Down. Read the story and break it into 2-3 main \"scenes.\"",
        "Step 3: Write Video Prompts. For each scene, write a video prompt describing what happens, just like in the last lesson!",
      ]),
      p("Now you have a \"storyboard\" made of prompts that could be used to create an AI-generated video!"),
    ], quiz(
      "After you get a story from the AI, what is the next step to plan your mini-movie?",
      ["Break it into 2-3 scenes", "Delete the story", "Print it out", "Ask for a new story"],
      0,
      "Exactly! Splitting the story into scenes gives you a storyboard you can turn into video prompts.",
    )),
    ("Your School Superhero", vec![
      p("The AI can be an amazing helper for school projects. It's great at brainstorming ideas, explaining tricky topics, and even summarizing long articles."),
      ex("I'm doing a school project on the Amazon rainforest. Can you give me 5 interesting ideas for what to focus on?"),
      ex("Explain how photosynthesis works like you're talking to a 10-year-old."),
    ], quiz(
      "Which of these is a great way to use AI for a school project?",
      ["Asking it to brainstorm ideas for your topic", "Asking it to pick your favorite subject", "Asking it to do nothing", "Asking it for a joke instead"],
      0,
      "Super! Brainstorming ideas and explaining tricky topics is where an AI helper really shines.",
    )),
    ("The Prompt Playground", vec![
      p("You've learned so much! 🏆 You now know the secrets to writing amazing prompts for all kinds of tasks. The only thing left to do is practice!"),
      p("Go to the other modules like the Prompt Sandbox or Image Magic. Try out your new skills! See what amazing things you can create."),
      p("The world of AI is your playground. Have fun exploring! ✨"),
    ], None),
  ];

  lessons
    .into_iter()
    .enumerate()
    .map(|(index, (title, content, quiz))| Lesson { index, title: title.into(), content, quiz })
    .collect()
}

/// The "What is Code?" tab of Code Wizards.
pub fn code_lesson() -> Vec<LessonBlock> {
  vec![
    p("Code is a Recipe for Computers! 🍳"),
    p("Imagine you're telling a robot how to make a peanut butter sandwich. You can't just say \"make a sandwich.\" You have to give it super clear, step-by-step instructions:"),
    steps(&[
      "Pick up a slice of bread.",
      "Open the peanut butter jar.",
      "Scoop some peanut butter with a knife.",
      "Spread it on the bread.",
    ]),
    p("Code is just like that! It's a special language we use to give computers and robots very specific instructions to follow."),
    p("What's It For? 🎮"),
    p("Code is the magic behind almost everything you use on a screen! It builds your favorite video games, fun apps, and awesome websites. It tells the computer exactly what to do, from making a character jump in a game to showing a funny video."),
    p("How Do You Write It? 🤔"),
    p("Writing code is like solving a puzzle. You break a big task into tiny, logical steps. When you ask the AI to help you write code in the 'Practice' tab, you need to be a great explainer! Tell it exactly what you want the code to do. The clearer you are, the better the code will be."),
    ex("Write Python code that asks for my name and then says hello to me."),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_course_is_well_formed() {
    let lessons = builtin_lessons();
    assert_eq!(lessons.len(), 10);
    for (i, lesson) in lessons.iter().enumerate() {
      assert_eq!(lesson.index, i);
      assert!(!lesson.content.is_empty());
      if let Some(q) = &lesson.quiz {
        assert!(q.is_well_formed(), "lesson {i}");
      }
    }
    assert!(lessons[..9].iter().all(|l| l.quiz.is_some()));
    assert!(lessons[9].quiz.is_none());
  }
}
