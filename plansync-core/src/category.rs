//! Event classification from description markers.

/// What kind of class block a description describes.
///
/// The category stays abstract on purpose; mapping it to a provider color
/// code is the orchestrator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Exam,
    OnlineOrCancelled,
    Lecture,
    Lab,
    Exercise,
    Unclassified,
}

impl Category {
    /// Classify a raw (uncleaned) description.
    ///
    /// Checks run top to bottom and the first hit wins, so an exam held
    /// online still files as an exam, and a lecture group marker beats the
    /// lab markers that can appear further down the same description.
    ///
    /// The export fills the `Uwagi` (notes) field only for exams, so a
    /// description without the empty-notes line reads as one.
    pub fn classify(description: &str) -> Category {
        if !description.contains("Uwagi: \n") {
            Category::Exam
        } else if description.contains("Sala: \n") || description.contains("Online") {
            Category::OnlineOrCancelled
        } else if description.contains("Grupy: Wyk") || description.contains("Grupy: Kon") {
            Category::Lecture
        } else if description.contains("Grupy: Lab") || description.contains("inf") {
            Category::Lab
        } else if description.contains("Grupy: Cw") || description.contains("Grupy: Lek") {
            Category::Exercise
        } else {
            Category::Unclassified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_notes_classify_as_exam() {
        let desc = "Sala: A 101\nUwagi: egzamin\nGrupy: Wyk1\n";
        assert_eq!(Category::classify(desc), Category::Exam);
    }

    #[test]
    fn test_missing_notes_line_classifies_as_exam() {
        // The export always writes an Uwagi line for regular blocks; a
        // description without one is treated like a filled one.
        let desc = "Sala: A 101\nGrupy: Wyk1\n";
        assert_eq!(Category::classify(desc), Category::Exam);
    }

    #[test]
    fn test_exam_beats_missing_room() {
        let desc = "Sala: \nUwagi: egzamin poprawkowy\nGrupy: Wyk1\n";
        assert_eq!(Category::classify(desc), Category::Exam);
    }

    #[test]
    fn test_empty_room_beats_lab_marker() {
        let desc = "Sala: \nUwagi: \nGrupy: Lab3\n";
        assert_eq!(Category::classify(desc), Category::OnlineOrCancelled);
    }

    #[test]
    fn test_online_marker_outside_keyed_lines() {
        let desc = "Sala: A 101\nUwagi: \nZajęcia Online do końca semestru\n";
        assert_eq!(Category::classify(desc), Category::OnlineOrCancelled);
    }

    #[test]
    fn test_lecture_and_consultation_groups() {
        assert_eq!(
            Category::classify("Uwagi: \nGrupy: Wyk1\n"),
            Category::Lecture
        );
        assert_eq!(
            Category::classify("Uwagi: \nGrupy: Kon2\n"),
            Category::Lecture
        );
    }

    #[test]
    fn test_lecture_beats_lab_when_both_match() {
        let desc = "Uwagi: \nGrupy: Wyk inf\n";
        assert_eq!(Category::classify(desc), Category::Lecture);
    }

    #[test]
    fn test_lab_group_and_informatics_marker() {
        assert_eq!(Category::classify("Uwagi: \nGrupy: Lab3\n"), Category::Lab);
        assert_eq!(
            Category::classify("Uwagi: \nProwadzący: mgr informatyki\n"),
            Category::Lab
        );
    }

    #[test]
    fn test_exercise_and_language_groups() {
        assert_eq!(
            Category::classify("Uwagi: \nGrupy: Cw5\n"),
            Category::Exercise
        );
        assert_eq!(
            Category::classify("Uwagi: \nGrupy: Lek1\n"),
            Category::Exercise
        );
    }

    #[test]
    fn test_unmatched_description_is_unclassified() {
        let desc = "Uwagi: \nGrupy: Proj2\n";
        assert_eq!(Category::classify(desc), Category::Unclassified);
    }
}
