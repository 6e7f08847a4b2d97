use sheetform_types::QuestionDefinition;

/// A named group of questions displayed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Display label of the section.
    pub name: String,

    /// Questions of this section, sorted by `order`.
    pub questions: Vec<QuestionDefinition>,
}

/// Questions grouped by section, in order of first appearance.
///
/// Fed with parser output (already sorted by section) the sections come out
/// alphabetically; an empty `Sections` means there is nothing to display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    /// Get a section by name.
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Iterate over the sections in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Section names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    /// Iterate over every question, section by section.
    pub fn questions(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.sections.iter().flat_map(|section| section.questions.iter())
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if there are no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Partition questions by section.
///
/// Sections keep the order in which they first appear in `questions`; within a
/// section questions are re-sorted by `order` (stable), so this holds even for
/// unsorted input.
pub fn group_by_section(questions: &[QuestionDefinition]) -> Sections {
    let mut sections: Vec<Section> = Vec::new();
    for question in questions {
        match sections.iter_mut().find(|s| s.name == question.section) {
            Some(section) => section.questions.push(question.clone()),
            None => sections.push(Section {
                name: question.section.clone(),
                questions: vec![question.clone()],
            }),
        }
    }

    for section in &mut sections {
        section.questions.sort_by_key(|q| q.order);
    }

    Sections { sections }
}
